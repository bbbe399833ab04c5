//! Task that owns the backend client for the lifetime of the app.
//!
//! Requests come in on an unbounded channel; every call runs in its own task
//! so a slow save never holds up a confirm. The analysis stream is the
//! exception: at most one runs, owned by a [`ScopedTask`] that is replaced
//! (and thereby aborted) when a new run starts.

use std::sync::Arc;

use catcheck_core::analysis::ResultStatus;
use catcheck_core::client::BackendClient;
use catcheck_core::notify::{Notification, Notifier};
use catcheck_core::stream::StreamItem;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::api::{ApiEvent, ApiRequest, RunId};
use crate::event::AppEvent;
use crate::task::ScopedTask;

/// Shared handles every request task needs.
#[derive(Clone)]
struct Ctx {
    client: BackendClient,
    events: UnboundedSender<AppEvent>,
    notifier: Arc<dyn Notifier>,
}

impl Ctx {
    fn send(&self, event: ApiEvent) {
        let _ = self.events.send(event.into());
    }

    fn fail(&self, what: &str, error: &catcheck_core::Error) {
        tracing::error!("{} failed: {}", what, error);
        self.notifier
            .notify(Notification::error(format!("{what} failed: {}", error.user_message())));
    }
}

/// Serves requests until the sender side is dropped.
pub async fn api_worker_loop(
    client: BackendClient,
    mut rx: UnboundedReceiver<ApiRequest>,
    events: UnboundedSender<AppEvent>,
    notifier: Arc<dyn Notifier>,
) {
    let ctx = Ctx {
        client,
        events,
        notifier,
    };
    let mut analysis: Option<ScopedTask> = None;

    while let Some(request) = rx.recv().await {
        match request {
            ApiRequest::RunAnalysis { run, params } => {
                if analysis.take().is_some() {
                    tracing::info!("aborting previous analysis stream");
                }
                let ctx = ctx.clone();
                analysis = Some(ScopedTask::spawn(async move {
                    run_analysis(ctx, run, params).await;
                }));
            }
            ApiRequest::StopAnalysis => {
                analysis = None;
            }
            other => {
                let ctx = ctx.clone();
                tokio::spawn(async move { handle_request(ctx, other).await });
            }
        }
    }
    tracing::debug!("api worker stopped");
}

async fn run_analysis(ctx: Ctx, run: RunId, params: catcheck_core::client::AnalysisParams) {
    let mut stream = match ctx.client.open_analysis(&params).await {
        Ok(stream) => stream,
        Err(e) => {
            ctx.fail("Analysis", &e);
            ctx.send(ApiEvent::AnalysisAborted { run });
            return;
        }
    };

    while let Some(item) = stream.next_item().await {
        match item {
            Ok(StreamItem::Result(result)) => ctx.send(ApiEvent::AnalysisResult { run, result }),
            Ok(StreamItem::Failure { message, row_index }) => {
                tracing::warn!(?row_index, "row analysis failed: {}", message);
                ctx.notifier.notify(Notification::error(message));
                ctx.send(ApiEvent::AnalysisRowFailed { run, row_index });
            }
            Ok(StreamItem::Done) => {
                ctx.notifier
                    .notify(Notification::success("Analysis completed successfully"));
                ctx.send(ApiEvent::AnalysisDone { run });
                return;
            }
            Err(e) => {
                ctx.fail("Analysis stream", &e);
                ctx.send(ApiEvent::AnalysisAborted { run });
                return;
            }
        }
    }
}

async fn handle_request(ctx: Ctx, request: ApiRequest) {
    match request {
        ApiRequest::LoadSheet { sheet_id, quiet } => match ctx.client.fetch_sheet(&sheet_id).await {
            Ok(data) => {
                if let Some(warning) = data.warning.as_deref().filter(|w| !w.is_empty()) {
                    ctx.notifier.notify(Notification::warning(warning));
                } else if !quiet {
                    ctx.notifier.notify(Notification::success(format!(
                        "Loaded {} rows",
                        data.rows.len()
                    )));
                }
                ctx.send(ApiEvent::SheetLoaded {
                    sheet_id,
                    data: Box::new(data),
                });
            }
            Err(e) => {
                ctx.fail("Loading the sheet", &e);
                ctx.send(ApiEvent::SheetFailed);
            }
        },

        ApiRequest::LoadAssistants => match ctx.client.list_assistants().await {
            Ok(assistants) => ctx.send(ApiEvent::AssistantsLoaded(assistants)),
            Err(e) => ctx.fail("Loading assistants", &e),
        },

        ApiRequest::LoadSavedSheets => match ctx.client.list_sheets().await {
            Ok(sheets) => ctx.send(ApiEvent::SavedSheetsLoaded(sheets)),
            Err(e) => ctx.fail("Loading saved sheets", &e),
        },

        ApiRequest::SaveResult { key, request } => {
            match ctx.client.save_gpt_response(&request).await {
                Ok(response_id) => {
                    tracing::debug!(?response_id, "result saved to backlog");
                    ctx.send(ApiEvent::Saved { key, response_id });
                }
                // The card stays; only persistence failed.
                Err(e) => ctx.fail("Saving the result", &e),
            }
        }

        ApiRequest::LoadLastResponses {
            params,
            page,
            per_page,
        } => match ctx.client.get_last_responses(&params, page, per_page).await {
            Ok(page) => ctx.send(ApiEvent::LastResponses(Box::new(page))),
            Err(e) => {
                ctx.fail("Loading previous results", &e);
                ctx.send(ApiEvent::LastResponsesFailed);
            }
        },

        ApiRequest::Confirm {
            key,
            response_id,
            write,
        } => {
            let outcome = async {
                ctx.client.update_sheet_data(&write).await?;
                ctx.client
                    .update_status(response_id, ResultStatus::Confirmed)
                    .await
            }
            .await;
            match outcome {
                Ok(()) => {
                    ctx.notifier
                        .notify(Notification::success("Data updated successfully"));
                    ctx.send(ApiEvent::Confirmed { key, write });
                }
                Err(e) => {
                    ctx.fail("Confirming", &e);
                    ctx.send(ApiEvent::ActionFailed { key });
                }
            }
        }

        ApiRequest::Reject { key, response_id } => {
            match ctx.client.update_status(response_id, ResultStatus::Rejected).await {
                Ok(()) => {
                    ctx.notifier.notify(Notification::success("Suggestion rejected"));
                    ctx.send(ApiEvent::Rejected { key });
                }
                Err(e) => {
                    ctx.fail("Rejecting", &e);
                    ctx.send(ApiEvent::ActionFailed { key });
                }
            }
        }

        ApiRequest::Feedback { key, result, text } => {
            match ctx.client.save_feedback(&result, &text).await {
                Ok(()) => {
                    ctx.notifier.notify(Notification::success("Feedback saved"));
                    ctx.send(ApiEvent::FeedbackSaved { key });
                }
                Err(e) => {
                    ctx.fail("Saving feedback", &e);
                    ctx.send(ApiEvent::ActionFailed { key });
                }
            }
        }

        ApiRequest::LoadBacklog => match ctx.client.get_gpt_responses().await {
            Ok(entries) => ctx.send(ApiEvent::BacklogLoaded(entries)),
            Err(e) => ctx.fail("Loading the backlog", &e),
        },

        ApiRequest::RunAnalysis { .. } | ApiRequest::StopAnalysis => {
            tracing::warn!("analysis request outside the worker loop ignored");
        }
    }
}
