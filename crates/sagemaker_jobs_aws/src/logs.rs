use crate::error::SageMakerError;
use crate::status_from_aws;

use aws_sdk_cloudwatchlogs::Client as LogsClient;
use aws_sdk_cloudwatchlogs::error::SdkError;
use aws_sdk_cloudwatchlogs::operation::get_log_events::GetLogEventsError;
use aws_sdk_sagemaker::Client as SageMakerClient;
use chrono::TimeZone;
use futures::stream::{self, BoxStream, StreamExt};
use sagemaker_jobs_core::prelude::*;
use std::collections::VecDeque;
use std::time::Duration;

pub const LOG_GROUP: &str = "/aws/sagemaker/TrainingJobs";

const MAX_TRANSIENT_ERRORS: u32 = 15;

struct LogStreamState {
    sagemaker: SageMakerClient,
    logs: LogsClient,
    job_name: String,
    poll_interval: Duration,
    log_stream_name: Option<String>,
    next_token: Option<String>,
    buffer: VecDeque<LogOutput>,
    finished: bool,
    error_count: u32,
}

type Item = Result<LogOutput, TrainingError>;

impl LogStreamState {
    /// Yields `err` and ends the stream on the next poll.
    fn fail(mut self, err: SageMakerError) -> Option<(Item, Self)> {
        self.finished = true;
        self.log_stream_name = None;
        self.buffer.clear();
        self.error_count = 0;
        Some((Err(err.into()), self))
    }

    async fn refresh_finished(&mut self) -> Result<(), SageMakerError> {
        let resp = self
            .sagemaker
            .describe_training_job()
            .training_job_name(&self.job_name)
            .send()
            .await?;
        if status_from_aws(&resp).is_terminal() {
            self.finished = true;
        }
        Ok(())
    }

    /// Looks up the stream of the (single) training instance, `<job>/algo-1-<epoch>`.
    async fn find_stream(&mut self) -> Result<(), SageMakerError> {
        let resp = self
            .logs
            .describe_log_streams()
            .log_group_name(LOG_GROUP)
            .log_stream_name_prefix(format!("{}/", self.job_name))
            .send()
            .await?;
        self.log_stream_name = resp
            .log_streams()
            .first()
            .and_then(|s| s.log_stream_name())
            .map(str::to_string);
        Ok(())
    }
}

/// Streams the CloudWatch events of a training job until it reaches a terminal state.
pub(crate) fn log_stream(
    sagemaker: SageMakerClient,
    logs: LogsClient,
    job_name: &str,
    poll_interval: Duration,
) -> BoxStream<'static, Item> {
    let state = LogStreamState {
        sagemaker,
        logs,
        job_name: job_name.to_string(),
        poll_interval,
        log_stream_name: None,
        next_token: None,
        buffer: VecDeque::new(),
        finished: false,
        error_count: 0,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.error_count > MAX_TRANSIENT_ERRORS {
                let err = SageMakerError::TooManyTransientErrors(state.job_name.clone());
                return state.fail(err);
            }

            if let Some(log) = state.buffer.pop_front() {
                return Some((Ok(log), state));
            }

            if state.finished && state.log_stream_name.is_none() {
                return None;
            }

            if state.log_stream_name.is_none() {
                if let Err(e) = state.refresh_finished().await {
                    return state.fail(e);
                }

                // The stream only shows up once the instance started.
                if let Err(e) = state.find_stream().await {
                    if is_transient(&e) {
                        state.error_count += 1;
                        tokio::time::sleep(state.poll_interval).await;
                        continue;
                    }
                    return state.fail(e);
                }

                if state.log_stream_name.is_none() {
                    if state.finished {
                        return None;
                    }
                    tokio::time::sleep(state.poll_interval).await;
                    continue;
                }
            }

            let Some(log_stream) = state.log_stream_name.clone() else {
                continue;
            };

            let mut req = state
                .logs
                .get_log_events()
                .log_group_name(LOG_GROUP)
                .log_stream_name(log_stream)
                .start_from_head(true);

            if let Some(ref token) = state.next_token {
                req = req.next_token(token);
            }

            match req.send().await {
                Ok(output) => {
                    state.error_count = 0;

                    let events = output.events();
                    if events.is_empty() {
                        if state.finished {
                            return None;
                        }
                        // Drain whatever was written before the job finished on the next round.
                        if state.refresh_finished().await.is_err() {
                            state.error_count += 1;
                        }
                        tokio::time::sleep(state.poll_interval).await;
                        continue;
                    }

                    state.next_token = output.next_forward_token().map(str::to_string);
                    for event in events {
                        let timestamp = event.timestamp().and_then(|ts| {
                            chrono::Utc
                                .timestamp_millis_opt(ts)
                                .single()
                                .map(|t| t.to_rfc3339())
                        });

                        state.buffer.push_back(LogOutput {
                            timestamp,
                            message: format!("{}\n", event.message().unwrap_or_default()),
                        });
                    }
                }
                Err(e) => {
                    if should_retry(&e) {
                        state.error_count += 1;
                        tokio::time::sleep(state.poll_interval).await;
                        continue;
                    }
                    return state.fail(e.into());
                }
            }
        }
    })
    .boxed()
}

fn is_transient(err: &SageMakerError) -> bool {
    match err {
        SageMakerError::DescribeLogStreams(e) => matches!(
            e,
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
        ),
        _ => false,
    }
}

fn should_retry(err: &SdkError<GetLogEventsError>) -> bool {
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => true,
        SdkError::ServiceError(context) => match context.err() {
            GetLogEventsError::ServiceUnavailableException(_) => true,
            GetLogEventsError::ResourceNotFoundException(_) => true,
            GetLogEventsError::InvalidParameterException(_) => false,
            _ => context.raw().status().is_server_error(),
        },
        _ => false,
    }
}
