//! Duel Replay entry point
//!
//! Native: plays a duel fixture headlessly and logs the event stream.
//! Web: drives the timeline from requestAnimationFrame with a small HUD.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use duel_replay::duel::{DuelRecord, DuelStage, MemorySource, ViewSide};
    use duel_replay::{PlaybackSettings, TimelineController};

    const SAMPLE_DUEL: &str = include_str!("../demos/sample_duel.json");
    /// Longest frame fed to the timeline (tab switches, breakpoints)
    const MAX_FRAME_MS: f64 = 250.0;

    /// App instance holding all state
    struct App {
        controller: TimelineController<MemorySource>,
        settings: PlaybackSettings,
        last_time: f64,
    }

    impl App {
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).clamp(0.0, MAX_FRAME_MS)
            } else {
                0.0
            };
            self.last_time = time;

            self.controller.update(dt);
            for event in self.controller.drain_events() {
                log::debug!("{:?}", event);
            }
        }

        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let set = |id: &str, text: &str| {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(text));
                }
            };

            for (side, prefix) in [(ViewSide::Left, "left"), (ViewSide::Right, "right")] {
                let shown = self.controller.stats().get(side).shown();
                set(&format!("{}-health", prefix), &shown.health.to_string());
                set(&format!("{}-damage", prefix), &shown.damage.to_string());
                set(&format!("{}-chance", prefix), &format!("{}%", shown.hit_chance));
            }

            let stage = match self.controller.duel_stage() {
                DuelStage::Loading => "Loading".to_string(),
                DuelStage::Ready => "Ready".to_string(),
                DuelStage::Animating { step } => format!("Step {}", step + 1),
                DuelStage::Paused { step } => format!("Paused at step {}", step + 1),
                DuelStage::Finished => match self.controller.winner() {
                    Some(ViewSide::Left) => "Left wins".to_string(),
                    Some(ViewSide::Right) => "Right wins".to_string(),
                    None => "No winner".to_string(),
                },
                DuelStage::Withdrawn => "Withdrawn".to_string(),
            };
            set("stage", &stage);
            set("speed", self.settings.speed.as_str());
        }

        fn cycle_speed(&mut self) {
            self.settings.speed = self.settings.speed.cycle();
            self.settings.save();
            self.controller.set_speed_factor(self.settings.speed_factor());
            log::info!("Speed: {}", self.settings.speed.as_str());
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Duel Replay starting...");

        let record =
            DuelRecord::from_json(SAMPLE_DUEL).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let duel_id = record.duel_id;
        let mut source = MemorySource::new();
        source.insert(record);

        let settings = PlaybackSettings::load();
        let mut controller = TimelineController::new(source, settings.clone());
        controller.set_duel(duel_id);

        let app = Rc::new(RefCell::new(App {
            controller,
            settings,
            last_time: 0.0,
        }));

        setup_buttons(app.clone());
        setup_keys(app.clone());
        request_animation_frame(app);

        log::info!("Duel {} loaded", duel_id);
        Ok(())
    }

    fn on_click(id: &str, app: Rc<RefCell<App>>, action: fn(&mut App)) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                action(&mut app.borrow_mut());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        on_click("play-btn", app.clone(), |a| a.controller.toggle_play());
        on_click("step-btn", app.clone(), |a| {
            a.controller.step_forward();
        });
        on_click("reset-btn", app.clone(), |a| a.controller.reset_duel());
        on_click("speed-btn", app, App::cycle_speed);
    }

    fn setup_keys(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut a = app.borrow_mut();
            match event.key().as_str() {
                " " => a.controller.toggle_play(),
                "ArrowRight" => {
                    a.controller.step_forward();
                }
                "r" | "R" => a.controller.reset_duel(),
                "s" | "S" => a.cycle_speed(),
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            a.update(time);
            a.update_hud();
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_app::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use duel_replay::duel::{DuelRecord, DuelStage, MemorySource, ViewSide};
    use duel_replay::{PlaybackSettings, ReplayError, Result, TimelineController, TimelineEvent};

    /// 60 Hz virtual frames
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Ten minutes of frames at the slowest preset is plenty
    const MAX_FRAMES: usize = 60 * 60 * 10;

    pub fn run(path: &str) -> Result<()> {
        let record = DuelRecord::load(path)?;
        let duel_id = record.duel_id;
        let mut source = MemorySource::new();
        source.insert(record);

        let settings = PlaybackSettings::load();
        log::info!("Replaying {} at {}", path, settings.speed.as_str());
        let mut controller = TimelineController::new(source, settings);
        controller.set_duel(duel_id);

        let mut elapsed_ms = 0.0;
        for _ in 0..MAX_FRAMES {
            controller.update(FRAME_MS);
            elapsed_ms += FRAME_MS;
            for event in controller.drain_events() {
                log_event(&controller, elapsed_ms, &event);
            }
            match controller.duel_stage() {
                DuelStage::Loading => {
                    return Err(ReplayError::InvalidRecord(format!(
                        "duel {} has no steps",
                        duel_id
                    )));
                }
                DuelStage::Finished | DuelStage::Withdrawn => break,
                _ => {}
            }
        }

        let stats = controller.stats();
        println!("\nDuel {} ({:?})", duel_id, controller.duel_stage());
        for (side, label) in [(ViewSide::Left, "Left "), (ViewSide::Right, "Right")] {
            let s = stats.get(side).shown();
            println!(
                "  {}  health {}  damage {}  hit chance {}%",
                label, s.health, s.damage, s.hit_chance
            );
        }
        match controller.winner() {
            Some(side) => println!("  Winner: {:?}", side),
            None => println!("  No winner"),
        }
        println!("  Replay time: {:.1}s", elapsed_ms / 1000.0);
        Ok(())
    }

    fn log_event(controller: &TimelineController<MemorySource>, elapsed_ms: f64, event: &TimelineEvent) {
        let t = elapsed_ms / 1000.0;
        match event {
            TimelineEvent::EnvironmentDrawn(card) if card.is_special() => {
                log::info!("[{:6.2}s] drew special {}", t, card.as_str())
            }
            TimelineEvent::EnvironmentDrawn(card) => log::info!("[{:6.2}s] drew {}", t, card.as_str()),
            TimelineEvent::CardRevealed(side, slot) => {
                let face = controller.hand(*side).unit(*slot).face;
                let label = face.map_or_else(|| "an unknown card".to_string(), |f| f.label());
                log::info!("[{:6.2}s] {:?} reveals {} ({})", t, side, slot, label)
            }
            TimelineEvent::StepAdvanced(step) => log::info!("[{:6.2}s] step {} done", t, step + 1),
            other => log::debug!("[{:6.2}s] {:?}", t, other),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/sample_duel.json".to_string());
    log::info!("Duel Replay (native) starting...");

    if let Err(e) = native::run(&path) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web builds start from wasm_main
}
