//! Frame-driven simulation loop
//!
//! Each frame runs, in order:
//! - Deferred commands (spawn, grow, shrink, reset)
//! - Delta time calculation
//! - Physics stepping
//! - Collision sound dispatch
//! - Proxy sync and bounds culling in one pass
//! - Rendering
//!
//! The loop never sleeps or blocks; the host decides when to call [`SimulationLoop::tick`].
//! It works with any [`Scene`] the host renders from.

use std::sync::mpsc::{self, Receiver, Sender};

use tumble_core::{
    AudioSink, BoundsCuller, CollisionAudioDispatcher, EntryId, ObjectRegistry, Scene, SpawnSpec, Spawner,
};
use tumble_physics::{PhysicsError, PhysicsWorld, StaticCollider};

use super::render::Renderer;
use crate::config::{AppConfig, ConfigError};

/// Request applied at the start of the next tick
#[derive(Clone, Debug)]
pub enum SimulationCommand {
    /// Spawn one object
    Spawn(SpawnSpec),
    /// Spawn this many random objects
    Grow(usize),
    /// Retire this many of the newest objects
    Shrink(usize),
    /// Retire everything
    RemoveAll,
}

/// Handle for queueing commands from outside the frame cycle
pub type CommandSender = Sender<SimulationCommand>;

/// Lifecycle of the loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// No frame has run yet
    Idle,
    Running,
}

/// Step parameters taken from `[physics]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepSettings {
    pub fixed_timestep: f32,
    pub max_substeps: u32,
    /// Frame deltas are clamped to this before stepping
    pub max_frame_delta: f32,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 3,
            max_frame_delta: 0.25,
        }
    }
}

/// What one tick did
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Clamped delta fed to the world
    pub delta: f32,
    pub substeps: u32,
    pub commands: usize,
    /// Proxies updated from their bodies
    pub synced: usize,
    pub culled: usize,
    /// Impact sounds requested
    pub sounds: usize,
    /// Objects alive after the frame
    pub live: usize,
}

/// Owns the world and the object pool and advances them frame by frame
pub struct SimulationLoop {
    world: PhysicsWorld,
    registry: ObjectRegistry,
    dispatcher: CollisionAudioDispatcher,
    culler: BoundsCuller,
    spawner: Spawner,
    settings: StepSettings,
    state: LoopState,
    previous_elapsed: f64,
    frame: u64,
    commands: Receiver<SimulationCommand>,
    sender: CommandSender,
}

impl SimulationLoop {
    /// Create a loop around an already populated world
    pub fn new(
        world: PhysicsWorld,
        dispatcher: CollisionAudioDispatcher,
        culler: BoundsCuller,
        spawner: Spawner,
        settings: StepSettings,
    ) -> Self {
        let (sender, commands) = mpsc::channel();
        Self {
            world,
            registry: ObjectRegistry::new(),
            dispatcher,
            culler,
            spawner,
            settings,
            state: LoopState::Idle,
            previous_elapsed: 0.0,
            frame: 0,
            commands,
            sender,
        }
    }

    /// Build world, floor, sound banks, culler and spawner from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let policy = config.contact_policy()?;
        let (floor, ball, cube) = config.spawn_materials(&policy)?;
        let dispatcher = config.audio_dispatcher(&policy)?;

        let mut world = PhysicsWorld::new(config.world_config(), policy);
        world.add_static_collider(StaticCollider::floor(config.physics.floor_y, floor))?;

        let spawner = Spawner::new(config.spawn.seed, config.spawn_settings(), ball, cube);
        let settings = StepSettings {
            fixed_timestep: config.physics.fixed_timestep,
            max_substeps: config.physics.max_substeps,
            max_frame_delta: config.physics.max_frame_delta,
        };
        Ok(Self::new(world, dispatcher, config.bounds_culler(), spawner, settings))
    }

    /// A new handle to the command channel
    pub fn command_sender(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Spawn immediately; only call between ticks
    pub fn spawn(&mut self, scene: &mut dyn Scene, spec: SpawnSpec) -> Result<EntryId, PhysicsError> {
        self.registry.spawn(&mut self.world, scene, spec)
    }

    /// Spawn `count` random objects immediately
    pub fn grow(&mut self, scene: &mut dyn Scene, count: usize) -> Result<Vec<EntryId>, PhysicsError> {
        self.registry.grow(&mut self.world, scene, &mut self.spawner, count)
    }

    /// Remove every object immediately
    pub fn remove_all(&mut self, scene: &mut dyn Scene) -> usize {
        self.registry.remove_all(&mut self.world, scene)
    }

    /// Run one frame at wall-clock time `elapsed` (seconds since start)
    pub fn tick<S: Scene>(
        &mut self,
        elapsed: f64,
        scene: &mut S,
        audio: &mut dyn AudioSink,
        renderer: &mut dyn Renderer<S>,
    ) -> FrameReport {
        if self.state == LoopState::Idle {
            log::info!("Simulation started with {} objects", self.registry.len());
            self.state = LoopState::Running;
        }
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };

        // 1. Deferred commands
        report.commands = self.apply_commands(scene);

        // 2. Delta time, capped so a stall never turns into a burst of substeps
        let raw = (elapsed - self.previous_elapsed) as f32;
        self.previous_elapsed = elapsed;
        report.delta = raw.max(0.0).min(self.settings.max_frame_delta);

        // 3. Step physics
        report.substeps = self.world.step(
            self.settings.fixed_timestep,
            report.delta,
            self.settings.max_substeps,
        );

        // 4. Collision sounds
        for event in self.world.drain_collision_events() {
            let Some(scale) = self
                .registry
                .entry_for_body(event.body)
                .and_then(|id| self.registry.get(id))
                .map(|entry| entry.scale)
            else {
                continue;
            };
            if self.dispatcher.dispatch(&event, scale, audio).is_some() {
                report.sounds += 1;
            }
        }

        // 5. Sync proxies, then cull, in a single removal-safe pass
        let Self {
            world,
            registry,
            culler,
            ..
        } = self;
        let (mut synced, mut culled) = (0, 0);
        registry.for_each(|registry, id| {
            if registry.sync_transform(world, scene, id).is_some() {
                synced += 1;
            }
            if culler.cull(registry, world, scene, audio, id) {
                culled += 1;
            }
        });
        report.synced = synced;
        report.culled = culled;
        report.live = self.registry.len();

        // 6. Render
        renderer.draw(scene);

        log::trace!("{:?}", report);
        report
    }

    /// Run one frame `delta` seconds after the previous one
    pub fn advance<S: Scene>(
        &mut self,
        delta: f64,
        scene: &mut S,
        audio: &mut dyn AudioSink,
        renderer: &mut dyn Renderer<S>,
    ) -> FrameReport {
        let elapsed = self.previous_elapsed + delta;
        self.tick(elapsed, scene, audio, renderer)
    }

    fn apply_commands(&mut self, scene: &mut dyn Scene) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands.try_recv() {
            applied += 1;
            match command {
                SimulationCommand::Spawn(spec) => {
                    if let Err(err) = self.registry.spawn(&mut self.world, scene, spec) {
                        log::warn!("Spawn rejected: {err}");
                    }
                }
                SimulationCommand::Grow(count) => {
                    if let Err(err) = self.registry.grow(&mut self.world, scene, &mut self.spawner, count) {
                        log::warn!("Grow stopped early: {err}");
                    }
                }
                SimulationCommand::Shrink(count) => {
                    self.registry.shrink(&mut self.world, scene, count);
                }
                SimulationCommand::RemoveAll => {
                    let removed = self.registry.remove_all(&mut self.world, scene);
                    log::debug!("Reset removed {removed} objects");
                }
            }
        }
        applied
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn spawner_mut(&mut self) -> &mut Spawner {
        &mut self.spawner
    }

    pub fn settings(&self) -> StepSettings {
        self.settings
    }
}
