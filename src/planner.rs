/// Itinerary planning flow:
/// validate fields, submit the prompt as a new thread+run, wait for the run, pull out the reply

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::agent::{AgentService, MessageRole, RunStatus, ThreadMessage, ThreadRun};
use crate::config::{DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_SECS};
use crate::error::{PlannerError, Result};
use crate::trip::TripRequest;

/// How often to check the run and how long to keep checking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
        }
    }
}

/// Shared across requests; holds no per-request state
#[derive(Clone)]
pub struct ItineraryPlanner {
    service: Arc<dyn AgentService>,
    agent_id: String,
    poll: PollPolicy,
}

impl ItineraryPlanner {
    pub fn new(service: Arc<dyn AgentService>, agent_id: impl Into<String>, poll: PollPolicy) -> Self {
        Self {
            service,
            agent_id: agent_id.into(),
            poll,
        }
    }

    /// Run the whole flow for one trip request and return the itinerary text.
    ///
    /// Validation failures return before any call to the agent service.
    /// `max_wait` bounds everything from submission to the message list.
    /// `cancel` aborts the flow at any await point.
    pub async fn plan(&self, request: &TripRequest, cancel: &CancellationToken) -> Result<String> {
        let trip = request.validate()?;
        let prompt = trip.prompt();

        tracing::info!(
            origin = %trip.origin,
            destination = %trip.destination,
            start_date = %trip.start_date,
            end_date = %trip.end_date,
            "submitting itinerary request"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("itinerary request cancelled");
                Err(PlannerError::Cancelled)
            }
            result = tokio::time::timeout(self.poll.max_wait, self.submit_and_collect(&prompt)) => {
                result.unwrap_or_else(|_| {
                    tracing::warn!(max_wait_secs = self.poll.max_wait.as_secs(), "agent did not answer in time");
                    Err(PlannerError::Timeout {
                        waited: self.poll.max_wait,
                    })
                })
            }
        }
    }

    async fn submit_and_collect(&self, prompt: &str) -> Result<String> {
        let run = self
            .service
            .create_thread_and_run(&self.agent_id, prompt)
            .await?;
        tracing::info!(thread_id = %run.thread_id, run_id = %run.id, status = ?run.status, "run created");

        let run = self.wait_for_run(run).await?;

        if run.status != RunStatus::Completed {
            let reason = run
                .last_error
                .as_ref()
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_default();
            tracing::warn!(status = ?run.status, %reason, "run ended without completing");
        }

        let messages = self.service.list_messages(&run.thread_id).await?;
        tracing::debug!(thread_id = %run.thread_id, count = messages.len(), "messages listed");

        let itinerary = extract_itinerary(&messages)?;
        tracing::info!(thread_id = %run.thread_id, length = itinerary.len(), "itinerary received");
        Ok(itinerary)
    }

    /// Poll until the run leaves queued/in_progress
    async fn wait_for_run(&self, mut run: ThreadRun) -> Result<ThreadRun> {
        let mut polls = 0u32;
        while run.status.is_pending() {
            tokio::time::sleep(self.poll.interval).await;
            run = self.service.get_run(&run.thread_id, &run.id).await?;
            polls += 1;
            tracing::debug!(run_id = %run.id, status = ?run.status, polls, "run status");
        }
        Ok(run)
    }
}

/// Pick the reply out of a thread's messages.
///
/// First assistant message in service order, first content block, verbatim.
pub fn extract_itinerary(messages: &[ThreadMessage]) -> Result<String> {
    if messages.is_empty() {
        return Err(PlannerError::NoMessages);
    }

    let reply = messages
        .iter()
        .find(|m| m.role == MessageRole::Assistant)
        .ok_or(PlannerError::NoAssistantMessage)?;

    reply
        .content
        .first()
        .and_then(|block| block.text_value())
        .map(str::to_string)
        .ok_or(PlannerError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{MessageContent, RunError, TextContent};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Agent service fake: replays a status script and returns canned messages
    struct ScriptedAgent {
        statuses: Mutex<VecDeque<RunStatus>>,
        messages: Vec<ThreadMessage>,
        prompts: Mutex<Vec<String>>,
        creates: AtomicUsize,
        polls: AtomicUsize,
        fail_on_list: bool,
        hang_on_create: bool,
    }

    impl ScriptedAgent {
        fn new(statuses: &[RunStatus], messages: Vec<ThreadMessage>) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                messages,
                prompts: Mutex::new(Vec::new()),
                creates: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
                fail_on_list: false,
                hang_on_create: false,
            }
        }

        fn next_run(&self) -> ThreadRun {
            let mut statuses = self.statuses.lock().unwrap();
            // Last status repeats forever
            let status = if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                *statuses.front().unwrap()
            };
            ThreadRun {
                id: "run_1".to_string(),
                thread_id: "thread_1".to_string(),
                status,
                last_error: (status == RunStatus::Failed).then(|| RunError {
                    code: "rate_limit_exceeded".to_string(),
                    message: "slow down".to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl AgentService for ScriptedAgent {
        async fn create_thread_and_run(&self, _agent_id: &str, prompt: &str) -> Result<ThreadRun> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.hang_on_create {
                std::future::pending::<()>().await;
            }
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.next_run())
        }

        async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<ThreadRun> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.next_run())
        }

        async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>> {
            if self.fail_on_list {
                return Err(PlannerError::Service {
                    status: 500,
                    body: "internal error".to_string(),
                });
            }
            Ok(self.messages.clone())
        }
    }

    fn text_message(id: &str, role: MessageRole, text: &str) -> ThreadMessage {
        ThreadMessage {
            id: id.to_string(),
            role,
            content: vec![MessageContent::Text {
                text: TextContent {
                    value: text.to_string(),
                },
            }],
        }
    }

    fn trip() -> TripRequest {
        TripRequest {
            origin: "Nashville, TN".to_string(),
            destination: "Boston, MA".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            end_date: NaiveDate::from_ymd_opt(2026, 11, 6),
        }
    }

    fn planner(agent: &Arc<ScriptedAgent>) -> ItineraryPlanner {
        ItineraryPlanner::new(agent.clone(), "asst_1", PollPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_in_progress_completed_returns_reply() {
        let agent = Arc::new(ScriptedAgent::new(
            &[RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed],
            vec![
                text_message("m2", MessageRole::Assistant, "Day 1: ..."),
                text_message("m1", MessageRole::User, "prompt"),
            ],
        ));

        let itinerary = planner(&agent)
            .plan(&trip(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(itinerary, "Day 1: ...");
        assert_eq!(agent.creates.load(Ordering::SeqCst), 1);
        assert_eq!(agent.polls.load(Ordering::SeqCst), 2);

        let prompts = agent.prompts.lock().unwrap();
        assert!(prompts[0].contains("Nashville, TN"));
        assert!(prompts[0].contains("Boston, MA"));
        assert!(prompts[0].contains("2026-11-02"));
        assert!(prompts[0].contains("2026-11-06"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_fields_make_no_calls() {
        let agent = Arc::new(ScriptedAgent::new(&[RunStatus::Completed], vec![]));
        let err = planner(&agent)
            .plan(&TripRequest::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(agent.creates.load(Ordering::SeqCst), 0);
        assert_eq!(agent.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_still_lists_messages() {
        let agent = Arc::new(ScriptedAgent::new(
            &[RunStatus::Queued, RunStatus::Failed],
            vec![text_message("m1", MessageRole::User, "prompt")],
        ));
        let err = planner(&agent)
            .plan(&trip(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::NoAssistantMessage));
        assert_eq!(agent.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_run_times_out() {
        let agent = Arc::new(ScriptedAgent::new(&[RunStatus::InProgress], vec![]));
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
        };
        let planner = ItineraryPlanner::new(agent.clone(), "asst_1", policy);

        let err = planner
            .plan(&trip(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlannerError::Timeout { waited } if waited == Duration::from_secs(10)));
        assert!(agent.polls.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_submission_times_out() {
        let mut agent = ScriptedAgent::new(&[RunStatus::Completed], vec![]);
        agent.hang_on_create = true;
        let agent = Arc::new(agent);
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
        };
        let planner = ItineraryPlanner::new(agent.clone(), "asst_1", policy);

        let started = tokio::time::Instant::now();
        let err = planner
            .plan(&trip(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlannerError::Timeout { waited } if waited == Duration::from_secs(10)));
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(agent.creates.load(Ordering::SeqCst), 1);
        assert_eq!(agent.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_waiting() {
        let agent = Arc::new(ScriptedAgent::new(&[RunStatus::InProgress], vec![]));
        let planner = planner(&agent);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let err = planner.plan(&trip(), &cancel).await.unwrap_err();
        assert!(matches!(err, PlannerError::Cancelled));
        assert!(agent.polls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_failure_surfaces_error_text() {
        let mut agent = ScriptedAgent::new(&[RunStatus::Completed], vec![]);
        agent.fail_on_list = true;
        let agent = Arc::new(agent);

        let err = planner(&agent)
            .plan(&trip(), &CancellationToken::new())
            .await
            .unwrap_err();
        let msg = err.user_message();
        assert!(msg.starts_with("An error occurred: "));
        assert!(msg.contains("internal error"));
    }

    #[test]
    fn test_extract_no_messages() {
        assert!(matches!(extract_itinerary(&[]), Err(PlannerError::NoMessages)));
    }

    #[test]
    fn test_extract_no_assistant_message() {
        let messages = vec![text_message("m1", MessageRole::User, "prompt")];
        let err = extract_itinerary(&messages).unwrap_err();
        assert_eq!(err.user_message(), "No response received. Please try again.");
    }

    #[test]
    fn test_extract_empty_content() {
        let messages = vec![ThreadMessage {
            id: "m1".to_string(),
            role: MessageRole::Assistant,
            content: vec![],
        }];
        let err = extract_itinerary(&messages).unwrap_err();
        assert_eq!(err.user_message(), "Unable to retrieve itinerary. Please try again.");
    }

    #[test]
    fn test_extract_non_text_first_block() {
        let messages = vec![ThreadMessage {
            id: "m1".to_string(),
            role: MessageRole::Assistant,
            content: vec![MessageContent::Other],
        }];
        assert!(matches!(extract_itinerary(&messages), Err(PlannerError::EmptyContent)));
    }

    #[test]
    fn test_extract_takes_first_assistant_message_verbatim() {
        let messages = vec![
            text_message("m0", MessageRole::User, "prompt"),
            text_message("m3", MessageRole::Assistant, "Day 1: ...\n\n**Hotel**"),
            text_message("m2", MessageRole::Assistant, "older reply"),
        ];
        assert_eq!(extract_itinerary(&messages).unwrap(), "Day 1: ...\n\n**Hotel**");
    }
}
