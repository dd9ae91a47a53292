//! Keeps the set of live stars equal to the most recent record list.
//!
//! The template is fetched once in the background. Updates issued before it arrives wait
//! for it; when several overlap, only the newest one still awaited is applied. Spin runs
//! as a frame task
//! that stops at `detach`, which also releases every star and the template itself.

use crate::error::StarsError;
use crate::record::StarRecord;
use crate::source::TemplateSource;
use crate::star::{Star, StarSpec};
use crate::style::StarStyle;
use ahash::{AHashMap, AHashSet};
use starfield_ids::NodeID;
use starfield_runtime::{FrameHandle, FrameLoop};
use starfield_scene::{Scene, SharedScene, lock_scene};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateStatus {
    Loading,
    /// Detached prototype every star is cloned from.
    Ready(NodeID),
    Failed(String),
    Released,
}

#[derive(Debug, Clone, Default)]
pub struct StarsOptions {
    pub highlight_ids: Vec<String>,
    pub style: StarStyle,
}

/// Outcome of one `update`. A superseded update changed nothing: a newer request was
/// applied instead, or is still waiting to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub added: usize,
    pub removed: usize,
    pub refreshed: usize,
    pub unchanged: usize,
    pub superseded: bool,
}

#[derive(Default)]
struct ManagerState {
    live: AHashMap<String, Star>,
    detached: bool,
    next_ticket: u64,
    /// Tickets of updates still waiting for the template or the lock.
    waiting: BTreeSet<u64>,
    /// Ticket of the last update that reconciled.
    applied: u64,
}

impl ManagerState {
    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.waiting.insert(self.next_ticket);
        self.next_ticket
    }

    fn is_superseded(&self, ticket: u64) -> bool {
        self.applied > ticket || self.waiting.range(ticket + 1..).next().is_some()
    }
}

/// Withdraws a ticket when its update finishes or is dropped mid-wait, so a cancelled
/// request never outranks an older live one.
struct PendingTicket<'a> {
    state: &'a Mutex<ManagerState>,
    ticket: u64,
}

impl Drop for PendingTicket<'_> {
    fn drop(&mut self) {
        lock_state(self.state).waiting.remove(&self.ticket);
    }
}

fn lock_state(state: &Mutex<ManagerState>) -> MutexGuard<'_, ManagerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every live star. Lock order is manager state, then scene.
pub struct StarsManager {
    scene: SharedScene,
    state: Arc<Mutex<ManagerState>>,
    status: Arc<watch::Sender<TemplateStatus>>,
    template: watch::Receiver<TemplateStatus>,
    highlights: AHashSet<String>,
    style: StarStyle,
    frame: FrameHandle,
    loader: JoinHandle<()>,
}

impl StarsManager {
    /// Starts the template fetch and registers the spin task. Must be called inside a
    /// tokio runtime.
    pub fn initialize(
        scene: SharedScene,
        frames: &mut FrameLoop,
        source: Arc<dyn TemplateSource>,
        options: StarsOptions,
    ) -> Self {
        let (tx, template) = watch::channel(TemplateStatus::Loading);
        let status = Arc::new(tx);
        let state = Arc::new(Mutex::new(ManagerState::default()));

        let loader = tokio::spawn(load_template(
            source,
            Arc::clone(&scene),
            Arc::clone(&state),
            Arc::clone(&status),
        ));

        let style = options.style;
        let spin_state = Arc::clone(&state);
        let spin_scene = Arc::clone(&scene);
        let frame = frames.schedule(move |_delta| {
            let mut state = lock_state(&spin_state);
            if state.detached {
                return;
            }
            let mut scene = lock_scene(&spin_scene);
            for star in state.live.values_mut() {
                star.spin(&mut scene, style.spin_step, style.spin_axis);
            }
        });

        Self {
            scene,
            state,
            status,
            template,
            highlights: options.highlight_ids.into_iter().collect(),
            style,
            frame,
            loader,
        }
    }

    /// Reconciles live stars against `records`. Waits for the template if it is still
    /// loading; returns a superseded report if a newer update, not since cancelled, was
    /// issued meanwhile.
    pub async fn update(&self, records: &[StarRecord]) -> Result<UpdateReport, StarsError> {
        let ticket = lock_state(&self.state).issue_ticket();
        let _pending = PendingTicket {
            state: &self.state,
            ticket,
        };
        let prototype = self.wait_for_template().await?;

        let mut state = lock_state(&self.state);
        state.waiting.remove(&ticket);
        if state.detached {
            return Err(StarsError::Detached);
        }
        if state.is_superseded(ticket) {
            log::warn!("star update #{ticket} superseded by a newer one");
            return Ok(UpdateReport {
                superseded: true,
                ..UpdateReport::default()
            });
        }
        let mut scene = lock_scene(&self.scene);
        let report = self.reconcile(&mut state, &mut scene, prototype, records)?;
        state.applied = ticket;
        log::info!(
            "stars updated: {} added, {} removed, {} refreshed, {} live",
            report.added,
            report.removed,
            report.refreshed,
            state.live.len()
        );
        Ok(report)
    }

    /// Stops spinning, disposes every star and releases the template. Returns how many
    /// stars were disposed; later calls return 0.
    pub fn detach(&self) -> usize {
        self.frame.cancel();
        let mut state = lock_state(&self.state);
        if state.detached {
            return 0;
        }
        state.detached = true;
        self.loader.abort();

        let mut scene = lock_scene(&self.scene);
        let mut disposed = 0;
        for (_, mut star) in state.live.drain() {
            star.dispose(&mut scene);
            disposed += 1;
        }
        let prototype = match &*self.status.borrow() {
            TemplateStatus::Ready(prototype) => Some(*prototype),
            _ => None,
        };
        if let Some(prototype) = prototype {
            scene.dispose_subtree(prototype);
        }
        self.status.send_replace(TemplateStatus::Released);
        log::info!("stars detached, {disposed} disposed");
        disposed
    }

    pub fn is_detached(&self) -> bool {
        lock_state(&self.state).detached
    }

    pub fn template_status(&self) -> TemplateStatus {
        self.template.borrow().clone()
    }

    pub fn len(&self) -> usize {
        lock_state(&self.state).live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        lock_state(&self.state).live.contains_key(id)
    }

    /// Live ids, sorted.
    pub fn live_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = lock_state(&self.state).live.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn star_root(&self, id: &str) -> Option<NodeID> {
        lock_state(&self.state).live.get(id).map(Star::root)
    }

    pub fn label(&self, id: &str) -> Option<String> {
        lock_state(&self.state)
            .live
            .get(id)
            .and_then(|star| star.label().map(str::to_string))
    }

    pub fn spin_angle(&self, id: &str) -> Option<f32> {
        lock_state(&self.state).live.get(id).map(Star::spin_angle)
    }

    /// Maps any node hit inside a star back to that star's id.
    pub fn pick(&self, node: NodeID) -> Option<String> {
        let state = lock_state(&self.state);
        let scene = lock_scene(&self.scene);
        let owner = &scene.find_tagged_ancestor(node)?.owner;
        state.live.contains_key(owner).then(|| owner.clone())
    }

    fn spec_for(&self, record: &StarRecord) -> StarSpec {
        StarSpec::new(record.id.clone(), record.color)
            .with_label(record.public_name.clone())
            .with_position(record.position)
            .with_highlight(record.related || self.highlights.contains(&record.id))
    }

    fn reconcile(
        &self,
        state: &mut ManagerState,
        scene: &mut Scene,
        prototype: NodeID,
        records: &[StarRecord],
    ) -> Result<UpdateReport, StarsError> {
        // Later duplicates overwrite earlier ones; first appearance fixes creation order.
        let mut order: Vec<&str> = Vec::with_capacity(records.len());
        let mut desired: AHashMap<&str, &StarRecord> = AHashMap::with_capacity(records.len());
        for record in records {
            if desired.insert(record.id.as_str(), record).is_none() {
                order.push(record.id.as_str());
            }
        }

        let mut report = UpdateReport::default();
        let stale: Vec<String> = state
            .live
            .keys()
            .filter(|id| !desired.contains_key(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if let Some(mut star) = state.live.remove(&id) {
                star.dispose(scene);
                report.removed += 1;
            }
        }

        for id in order {
            let spec = self.spec_for(desired[id]);
            match state.live.get_mut(id) {
                Some(star) => {
                    if star.refresh(scene, &spec, &self.style) {
                        report.refreshed += 1;
                    } else {
                        report.unchanged += 1;
                    }
                }
                None => {
                    let star = Star::instantiate(scene, prototype, &spec, &self.style)?;
                    star.attach(scene);
                    state.live.insert(id.to_string(), star);
                    report.added += 1;
                }
            }
        }
        Ok(report)
    }

    async fn wait_for_template(&self) -> Result<NodeID, StarsError> {
        let mut template = self.template.clone();
        let status = {
            let status = template
                .wait_for(|s| *s != TemplateStatus::Loading)
                .await
                .map_err(|_| StarsError::Detached)?;
            status.clone()
        };
        match status {
            TemplateStatus::Ready(prototype) => Ok(prototype),
            TemplateStatus::Failed(reason) => Err(StarsError::TemplateUnavailable(reason)),
            TemplateStatus::Released | TemplateStatus::Loading => Err(StarsError::Detached),
        }
    }
}

impl Drop for StarsManager {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn load_template(
    source: Arc<dyn TemplateSource>,
    scene: SharedScene,
    state: Arc<Mutex<ManagerState>>,
    status: Arc<watch::Sender<TemplateStatus>>,
) {
    let result = source.load().await;
    let state = lock_state(&state);
    if state.detached {
        status.send_replace(TemplateStatus::Released);
        return;
    }
    match result {
        Ok(model) => {
            let prototype = lock_scene(&scene).spawn_model(&model);
            log::info!(
                "star template ready ({} meshes), prototype {prototype}",
                model.mesh_count()
            );
            status.send_replace(TemplateStatus::Ready(prototype));
        }
        Err(err) => {
            log::error!("star template failed to load: {err}");
            status.send_replace(TemplateStatus::Failed(err.to_string()));
        }
    }
}
