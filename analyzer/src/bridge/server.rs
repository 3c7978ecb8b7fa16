use crate::bridge::model::{JobRecord, JobRequest, JobStatus, ResultsView, StatusView};
use crate::bridge::store::JobStore;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::runner::Runner;
use chrono::Utc;
use log::{error, info, warn};
use serde_json::json;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
};
use tokio::runtime::Builder;
use uuid::Uuid;
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
    Filter,
};

pub fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

type Reply = WithStatus<Json>;

fn reply<T: serde::Serialize>(body: &T, status: StatusCode) -> Reply {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn detail(message: &str, status: StatusCode) -> Reply {
    reply(&json!({ "detail": message }), status)
}

/// HTTP front for submitting analysis jobs and collecting their reports.
#[derive(Clone)]
pub struct JobBridge {
    store: Arc<dyn JobStore>,
    defaults: Arc<WorkflowConfig>,
    cancels: Arc<Mutex<HashMap<Uuid, Arc<AtomicBool>>>>,
}

impl JobBridge {
    pub fn new(store: Arc<dyn JobStore>, defaults: WorkflowConfig) -> Self {
        Self {
            store,
            defaults: Arc::new(defaults),
            cancels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Jobs that reached `completed` or `failed` and are still stored.
    pub fn finished_jobs(&self) -> usize {
        self.store.list().iter().filter(|record| record.is_finished()).count()
    }

    pub fn submit(&self, request: JobRequest) -> JobRecord {
        let record = JobRecord::pending(request.avatar_id.clone());
        self.store.put(record.clone());
        let bridge = self.clone();
        let job_id = record.job_id;
        thread::spawn(move || bridge.run_job(job_id, &request));
        info!("job {} submitted", job_id);
        record
    }

    /// Drives one job through `processing` to `completed` or `failed`.
    pub fn run_job(&self, job_id: Uuid, request: &JobRequest) {
        let flag = Arc::new(AtomicBool::new(false));
        self.cancels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id, flag.clone());

        let started = self.store.update(&job_id, &mut |record| {
            record.status = JobStatus::Processing;
            record.progress = 0.1;
        });
        if started {
            self.execute(job_id, request, flag);
        }

        self.cancels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&job_id);
    }

    fn execute(&self, job_id: Uuid, request: &JobRequest, flag: Arc<AtomicBool>) {
        let store = self.store.clone();
        let progress = move |fraction: f64| {
            store.update(&job_id, &mut |record| record.progress = 0.1 + 0.8 * fraction);
        };
        let runner = Runner::new(request.to_workflow(&self.defaults));

        match runner.execute(Some(&progress), Some(flag)) {
            Ok(outcome) => {
                info!(
                    "job {} completed: {} shots in {:.1}s",
                    job_id,
                    outcome.result.shot_count(),
                    outcome.result.video_duration
                );
                let mut report = Some(outcome.result.to_report());
                self.store.update(&job_id, &mut |record| {
                    record.status = JobStatus::Completed;
                    record.progress = 1.0;
                    record.completed_at = Some(Utc::now());
                    record.results = report.take();
                });
            }
            Err(err) => {
                let message = format!("{:#}", err);
                warn!("job {} failed: {}", job_id, message);
                self.store.update(&job_id, &mut |record| {
                    record.status = JobStatus::Failed;
                    record.completed_at = Some(Utc::now());
                    record.error = Some(message.clone());
                });
            }
        }
    }

    fn results(&self, job_id: Uuid) -> Reply {
        let Some(record) = self.store.get(&job_id) else {
            return detail("Job not found", StatusCode::NOT_FOUND);
        };
        match (record.status, record.results) {
            (JobStatus::Pending, _) => detail("Analysis not yet started", StatusCode::ACCEPTED),
            (JobStatus::Processing, _) => detail(
                &format!("Analysis in progress: {:.1}%", record.progress * 100.0),
                StatusCode::ACCEPTED,
            ),
            (JobStatus::Failed, _) => detail(
                record.error.as_deref().unwrap_or("Analysis failed"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (JobStatus::Completed, Some(report)) => {
                reply(&ResultsView::new(job_id, report), StatusCode::OK)
            }
            (JobStatus::Completed, None) => {
                detail("Analysis results missing", StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn delete(&self, job_id: Uuid) -> Reply {
        if self.store.delete(&job_id).is_none() {
            return detail("Job not found", StatusCode::NOT_FOUND);
        }
        if let Some(flag) = self
            .cancels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
        {
            flag.store(true, Ordering::SeqCst);
        }
        info!("job {} deleted", job_id);
        reply(&json!({ "message": "Job deleted successfully" }), StatusCode::OK)
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let bridge = self.clone();
        let bridge_filter = warp::any().map(move || bridge.clone());

        let root = warp::path::end().and(warp::get()).map(|| {
            reply(
                &json!({
                    "service": "Rally Analysis API",
                    "version": env!("CARGO_PKG_VERSION"),
                    "status": "running",
                    "endpoints": {
                        "POST /analyze": "Submit a match for analysis",
                        "GET /status/{job_id}": "Check job status",
                        "GET /results/{job_id}": "Get analysis results"
                    }
                }),
                StatusCode::OK,
            )
        });

        let analyze = warp::path("analyze")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge_filter.clone())
            .map(|request: JobRequest, bridge: JobBridge| {
                let record = bridge.submit(request);
                reply(
                    &json!({
                        "job_id": record.job_id,
                        "status": record.status,
                        "message": "Analysis queued.",
                        "status_url": format!("/status/{}", record.job_id),
                        "results_url": format!("/results/{}", record.job_id),
                    }),
                    StatusCode::OK,
                )
            });

        let status = warp::path!("status" / Uuid)
            .and(warp::get())
            .and(bridge_filter.clone())
            .map(|job_id: Uuid, bridge: JobBridge| match bridge.store.get(&job_id) {
                Some(record) => reply(&StatusView::from(&record), StatusCode::OK),
                None => detail("Job not found", StatusCode::NOT_FOUND),
            });

        let results = warp::path!("results" / Uuid)
            .and(warp::get())
            .and(bridge_filter.clone())
            .map(|job_id: Uuid, bridge: JobBridge| bridge.results(job_id));

        let delete = warp::path!("jobs" / Uuid)
            .and(warp::delete())
            .and(bridge_filter.clone())
            .map(|job_id: Uuid, bridge: JobBridge| bridge.delete(job_id));

        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(bridge_filter)
            .map(|bridge: JobBridge| {
                reply(
                    &json!({
                        "status": "healthy",
                        "timestamp": Utc::now(),
                        "active_jobs": bridge.store.count_with_status(JobStatus::Processing),
                        "finished_jobs": bridge.finished_jobs(),
                    }),
                    StatusCode::OK,
                )
            });

        root.or(analyze)
            .or(status)
            .or(results)
            .or(delete)
            .or(health)
    }

    /// Serves the routes on a dedicated thread with its own runtime.
    pub fn spawn(&self, addr: SocketAddr) -> thread::JoinHandle<()> {
        let routes = self.routes();
        thread::spawn(move || {
            match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(async move {
                    info!("job bridge listening on {}", addr);
                    warp::serve(routes).run(addr).await;
                }),
                Err(err) => error!("could not start job bridge runtime: {}", err),
            }
        })
    }
}
