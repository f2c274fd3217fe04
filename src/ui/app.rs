use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui;
use tokio::sync::{mpsc, oneshot};

use super::comparison::ComparisonView;
use super::dashboard::{DashboardView, Listing};
use super::editor::EditorView;
use super::image_cache::ImageCache;
use super::preview::PreviewView;
use super::session::UnsavedCompanies;
use super::{theme, widgets};
use crate::config::{AppConfig, INITIAL_COMPANIES};
use crate::error::{OutreachError, Result};
use crate::map::geometry::WorldGeometry;
use crate::map::interaction::MapState;
use crate::map::projection::MercatorProjection;
use crate::map::MapController;
use crate::maps_api::boundary_retriever::BoundaryRetriever;
use crate::model::Company;
use crate::store::blob::{executive_image_path, logo_path, upload_image};
use crate::store::{seed_defaults, BlobStore, CompanyStore, JsonFileStore, LocalBlobStore, MemoryStore};

/// What a view asks the app to do on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ShowDashboard,
    Edit(String),
    Preview(String),
    Compare,
    Refresh,
    Create(String),
    Delete(String),
    RetryUnsaved,
    Upload {
        company_id: String,
        target: UploadTarget,
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadTarget {
    Logo,
    Executive(String),
}

/// Results of background work, drained once per frame.
enum AppMessage {
    World(Result<WorldGeometry>),
    Companies(Result<Vec<Company>>),
    Created(Result<Company>),
    Deleted(String, Result<()>),
    Opened(String, Result<Company>),
    Saved {
        company_id: String,
        revision: u64,
        result: Result<()>,
    },
    Flushed(Company, Result<()>),
    Uploaded {
        company_id: String,
        target: UploadTarget,
        result: Result<String>,
    },
}

/// Store work, run one job at a time in submission order so a save issued
/// when leaving the editor lands before the next listing or load.
enum StoreJob {
    List,
    Open(String),
    Create(String),
    Delete(String),
    Save { company: Company, revision: u64 },
    /// Final save of a working copy whose editor has closed.
    Flush(Company),
    /// Signals once every job queued before it has finished.
    Barrier(oneshot::Sender<()>),
}

async fn run_store_jobs(
    store: Arc<dyn CompanyStore>,
    mut jobs: mpsc::UnboundedReceiver<StoreJob>,
    sender: mpsc::UnboundedSender<AppMessage>,
    requester: egui::Context,
) {
    while let Some(job) = jobs.recv().await {
        let message = match job {
            StoreJob::List => AppMessage::Companies(store.list().await),
            StoreJob::Open(id) => {
                let result = store.get(&id).await;
                AppMessage::Opened(id, result)
            }
            StoreJob::Create(name) => AppMessage::Created(store.create(&name).await),
            StoreJob::Delete(id) => {
                let result = store.delete(&id).await;
                AppMessage::Deleted(id, result)
            }
            StoreJob::Save { company, revision } => {
                let result = store.put(&company).await;
                AppMessage::Saved {
                    company_id: company.id,
                    revision,
                    result,
                }
            }
            StoreJob::Flush(company) => {
                let result = store.put(&company).await;
                AppMessage::Flushed(company, result)
            }
            StoreJob::Barrier(done) => {
                let _ = done.send(());
                continue;
            }
        };
        if sender.send(message).is_err() {
            break;
        }
        requester.request_repaint();
    }
}

enum Screen {
    Dashboard(DashboardView),
    Editor(EditorView),
    Preview(PreviewView),
    Comparison(ComparisonView),
}

pub struct OutreachApp {
    runtime: tokio::runtime::Runtime,
    sender: mpsc::UnboundedSender<AppMessage>,
    receiver: mpsc::UnboundedReceiver<AppMessage>,
    jobs: mpsc::UnboundedSender<StoreJob>,
    blobs: Arc<dyn BlobStore>,
    world: Option<Result<Arc<WorldGeometry>>>,
    images: ImageCache,
    companies: Vec<Company>,
    loading: bool,
    listing_error: Option<String>,
    unsaved: UnsavedCompanies,
    screen: Screen,
}

impl OutreachApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig, runtime: tokio::runtime::Runtime) -> Self {
        cc.egui_ctx.set_style(theme::dark_style(&cc.egui_ctx));
        let (sender, receiver) = mpsc::unbounded_channel();

        let store: Arc<dyn CompanyStore> = match runtime.block_on(JsonFileStore::open(&config.data_dir)) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::error!("falling back to an in-memory store: {}", e);
                Arc::new(MemoryStore::default())
            }
        };
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&config.blob_dir, config.blob_base_url.clone()));
        let images = ImageCache::new(runtime.handle().clone());

        if config.seed_companies {
            if let Err(e) = runtime.block_on(seed_defaults(store.as_ref(), INITIAL_COMPANIES)) {
                log::error!("seeding failed: {}", e);
            }
        }

        let (jobs, job_receiver) = mpsc::unbounded_channel();
        runtime.spawn(run_store_jobs(store, job_receiver, sender.clone(), cc.egui_ctx.clone()));

        let mut app = Self {
            runtime,
            sender,
            receiver,
            jobs,
            blobs,
            world: None,
            images,
            companies: Vec::new(),
            loading: false,
            listing_error: None,
            unsaved: UnsavedCompanies::default(),
            screen: Screen::Dashboard(DashboardView::default()),
        };

        let retriever = BoundaryRetriever::new(config.boundary_source.clone(), config.boundary_name_key.clone());
        app.spawn(&cc.egui_ctx, async move {
            AppMessage::World(retriever.fetch_world(MercatorProjection::default()).await)
        });

        app.refresh();
        app
    }

    fn spawn<F>(&self, ctx: &egui::Context, task: F)
    where
        F: Future<Output = AppMessage> + Send + 'static,
    {
        let sender = self.sender.clone();
        let requester = ctx.clone();
        self.runtime.spawn(async move {
            let message = task.await;
            if sender.send(message).is_ok() {
                requester.request_repaint();
            }
        });
    }

    fn submit(&self, job: StoreJob) {
        if self.jobs.send(job).is_err() {
            log::error!("store worker has stopped");
        }
    }

    fn refresh(&mut self) {
        self.loading = true;
        self.submit(StoreJob::List);
    }

    /// Leaving the editor must not drop edits still waiting on the debounce.
    /// Returns whether anything was queued.
    fn flush_editor(&mut self) -> bool {
        let Screen::Editor(view) = &self.screen else { return false };
        let Some(session) = view.session.as_ref() else { return false };
        if !session.is_dirty() {
            return false;
        }
        self.submit(StoreJob::Flush(session.company().clone()));
        true
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: Action) {
        log::debug!("action: {:?}", action);
        match action {
            Action::ShowDashboard => {
                self.flush_editor();
                self.screen = Screen::Dashboard(DashboardView::default());
                self.refresh();
            }
            Action::Edit(id) => {
                self.flush_editor();
                self.screen = Screen::Editor(EditorView::new(id.clone()));
                self.submit(StoreJob::Open(id));
            }
            Action::Preview(id) => {
                self.flush_editor();
                self.screen = Screen::Preview(PreviewView::new(id.clone()));
                self.submit(StoreJob::Open(id));
            }
            Action::Compare => {
                self.flush_editor();
                self.screen = Screen::Comparison(ComparisonView::default());
                self.refresh();
            }
            Action::Refresh => self.refresh(),
            Action::Create(name) => self.submit(StoreJob::Create(name)),
            Action::Delete(id) => self.submit(StoreJob::Delete(id)),
            Action::RetryUnsaved => {
                for company in self.unsaved.take_all() {
                    self.submit(StoreJob::Flush(company));
                }
            }
            Action::Upload { company_id, target, path } => {
                let blobs = self.blobs.clone();
                self.spawn(ctx, async move {
                    let result: Result<String> = async {
                        let bytes = tokio::fs::read(&path)
                            .await
                            .map_err(|e| OutreachError::Blob(format!("{}: {}", path.display(), e)))?;
                        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                        let blob_path = match &target {
                            UploadTarget::Logo => logo_path(&company_id, file_name),
                            UploadTarget::Executive(exec_id) => executive_image_path(&company_id, exec_id, file_name),
                        };
                        upload_image(blobs.as_ref(), bytes, &blob_path).await
                    }
                    .await;
                    AppMessage::Uploaded { company_id, target, result }
                });
            }
        }
    }

    fn process_messages(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                AppMessage::World(result) => {
                    match &result {
                        Ok(world) => log::info!("world map ready, {} countries", world.countries().len()),
                        Err(e) => log::error!("world map unavailable: {}", e),
                    }
                    self.world = Some(result.map(Arc::new));
                }
                AppMessage::Companies(result) => {
                    self.loading = false;
                    match result {
                        Ok(companies) => {
                            self.companies = companies;
                            self.listing_error = None;
                            if let Screen::Comparison(view) = &mut self.screen {
                                view.companies_reloaded();
                            }
                        }
                        Err(e) => {
                            log::error!("listing companies failed: {}", e);
                            self.listing_error = Some(e.to_string());
                        }
                    }
                }
                AppMessage::Created(result) => match result {
                    Ok(company) => {
                        self.companies.push(company);
                        self.companies
                            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
                    }
                    Err(e) => {
                        log::error!("creating company failed: {}", e);
                        self.listing_error = Some(e.to_string());
                    }
                },
                AppMessage::Deleted(id, result) => match result {
                    Ok(()) => self.companies.retain(|c| c.id != id),
                    Err(e) => {
                        log::error!("deleting {} failed: {}", id, e);
                        self.listing_error = Some(e.to_string());
                    }
                },
                AppMessage::Opened(id, result) => match &mut self.screen {
                    Screen::Editor(view) if view.id == id => {
                        view.loaded(result);
                        if view.session.is_some() {
                            if let Some(unsaved) = self.unsaved.take(&id) {
                                view.restore(unsaved);
                            }
                        }
                    }
                    Screen::Preview(view) if view.id == id => view.loaded(result),
                    _ => {}
                },
                AppMessage::Saved { company_id, revision, result } => match &mut self.screen {
                    Screen::Editor(view) if view.id == company_id => {
                        if let Some(session) = view.session.as_mut() {
                            session.save_finished(revision, result);
                        }
                    }
                    _ => {
                        if let Err(e) = result {
                            log::error!("stale save of {} failed: {}", company_id, e);
                        }
                    }
                },
                AppMessage::Flushed(company, result) => self.unsaved.flush_finished(company, result),
                AppMessage::Uploaded { company_id, target, result } => match &mut self.screen {
                    Screen::Editor(view) if view.id == company_id => view.upload_finished(target, result),
                    _ => log::warn!("upload for {} finished after leaving the editor", company_id),
                },
            }
        }
    }

    /// Issues the debounced save for the open editor, if one is due.
    fn autosave(&mut self, ctx: &egui::Context) {
        let Screen::Editor(view) = &mut self.screen else { return };
        let Some(session) = view.session.as_mut() else { return };
        let now = Instant::now();

        if let Some((revision, company)) = session.poll_save(now) {
            if self.jobs.send(StoreJob::Save { company, revision }).is_err() {
                log::error!("store worker has stopped");
            }
        } else if let Some(wait) = session.time_until_save(now) {
            ctx.request_repaint_after(wait);
        }
    }
}

fn attach_world(controller: &mut MapController, world: &Option<Result<Arc<WorldGeometry>>>) {
    match world {
        Some(Ok(geometry)) if controller.geometry().is_none() => controller.boundaries_loaded(geometry.clone()),
        Some(Err(e)) if !matches!(controller.state(), MapState::Uninitialized { failure: Some(_) }) => {
            controller.boundaries_failed(e)
        }
        _ => {}
    }
}

impl eframe::App for OutreachApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // F11 toggles fullscreen
        if let Some(new_fullscreen) = ctx.input(|i| {
            i.key_pressed(egui::Key::F11)
                .then(|| !i.viewport().fullscreen.unwrap_or(false))
        }) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(new_fullscreen));
        }

        self.images.process(ctx);
        self.process_messages();

        let mut actions = Vec::new();
        if !self.unsaved.is_empty() {
            egui::TopBottomPanel::top("unsaved_changes").show(ctx, |ui| {
                for message in self.unsaved.messages() {
                    widgets::error_text(ui, message);
                }
                ui.horizontal(|ui| {
                    if ui.button("Retry saving").clicked() {
                        actions.push(Action::RetryUnsaved);
                    }
                    widgets::muted(ui, "Reopening the company in the editor also restores these edits.");
                });
            });
        }
        egui::CentralPanel::default().show(ctx, |ui| match &mut self.screen {
            Screen::Dashboard(view) => {
                let listing = Listing {
                    companies: &self.companies,
                    loading: self.loading,
                    error: self.listing_error.as_deref(),
                };
                view.show(ui, listing, &mut self.images, &mut actions);
            }
            Screen::Editor(view) => {
                attach_world(&mut view.map, &self.world);
                view.show(ui, &mut self.images, &mut actions);
            }
            Screen::Preview(view) => {
                attach_world(&mut view.map, &self.world);
                view.show(ui, &mut self.images, &mut actions);
            }
            Screen::Comparison(view) => view.show(ui, &self.companies, self.loading, &mut actions),
        });

        for action in actions {
            self.handle_action(ctx, action);
        }
        self.autosave(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if !self.flush_editor() {
            return;
        }
        let (done, finished) = oneshot::channel();
        self.submit(StoreJob::Barrier(done));
        if self.runtime.block_on(finished).is_err() {
            log::error!("store worker stopped before the final save");
        }
        self.process_messages();
    }
}
