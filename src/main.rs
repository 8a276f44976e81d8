//! Snake Presenter entry point
//!
//! Browser: WebSocket snapshots in, Canvas2D frames out, keyboard and taps
//! turned into commands. Native: replays a recorded session through the same
//! engine and logs what it would have shown.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_client {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MessageEvent, MouseEvent, TouchEvent, WebSocket};

    use snake_presenter::audio::{AudioFeedback, AudioManager};
    use snake_presenter::commands::ClientCommand;
    use snake_presenter::consts::*;
    use snake_presenter::persistence::{KeyValueStore, default_store};
    use snake_presenter::platform::{TimerSlot, now_ms};
    use snake_presenter::renderer::canvas::CanvasSurface;
    use snake_presenter::{BestScore, PresentationEngine, Settings};

    /// Client instance holding all state
    struct Client {
        engine: PresentationEngine,
        surface: CanvasSurface,
        socket: Option<WebSocket>,
        reconnect: TimerSlot<i32>,
        /// Where settings are written when the player changes them
        settings_store: Box<dyn KeyValueStore>,
    }

    impl Client {
        /// Send a command if the socket is open
        fn send(&self, cmd: ClientCommand) {
            let Some(ws) = &self.socket else { return };
            if ws.ready_state() != WebSocket::OPEN {
                return;
            }
            if let Err(err) = ws.send_with_str(&cmd.to_json()) {
                log::warn!("Send failed: {err:?}");
            }
        }

        fn toggle_mute(&mut self) {
            self.engine.toggle_mute();
            self.engine.settings().save(self.settings_store.as_mut());
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialised".into());
        }

        log::info!("Snake Presenter starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        canvas.set_width((BOARD_COLS as f32 * CELL_SIZE) as u32);
        canvas.set_height((BOARD_ROWS as f32 * CELL_SIZE) as u32);

        let store = default_store();
        let settings = Settings::load(store.as_ref());
        let audio = AudioFeedback::new(Box::new(AudioManager::new(settings.effective_volume())));
        let best = BestScore::load(store);
        let engine = PresentationEngine::new(settings, best, audio, now_ms() as u64);

        let client = Rc::new(RefCell::new(Client {
            engine,
            surface: CanvasSurface::new(&canvas)?,
            socket: None,
            reconnect: TimerSlot::new(),
            settings_store: default_store(),
        }));

        connect(&client);
        setup_input_handlers(&canvas, &client);
        request_animation_frame(client);
        Ok(())
    }

    fn socket_url() -> Option<String> {
        let location = web_sys::window()?.location();
        let scheme = if location.protocol().ok()? == "https:" {
            "wss:"
        } else {
            "ws:"
        };
        Some(format!("{scheme}//{}/ws", location.host().ok()?))
    }

    fn connect(client: &Rc<RefCell<Client>>) {
        // A manual or timer-driven connect supersedes any pending retry
        let pending = client.borrow_mut().reconnect.cancel();
        if let (Some(handle), Some(window)) = (pending, web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }

        let Some(url) = socket_url() else {
            log::error!("Cannot work out the server address");
            return;
        };
        let ws = match WebSocket::new(&url) {
            Ok(ws) => ws,
            Err(err) => {
                log::warn!("WebSocket to {url} failed: {err:?}");
                schedule_reconnect(client);
                return;
            }
        };

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                log::info!("WebSocket connected");
            });
            ws.set_onopen(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        {
            let client = client.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MessageEvent| {
                if let Some(text) = event.data().as_string() {
                    client.borrow_mut().engine.on_message(&text, now_ms());
                }
            });
            ws.set_onmessage(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                log::warn!("WebSocket error");
            });
            ws.set_onerror(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        {
            let client = client.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::CloseEvent| {
                log::info!("WebSocket closed");
                {
                    let mut c = client.borrow_mut();
                    c.socket = None;
                    c.engine.on_disconnect();
                }
                schedule_reconnect(&client);
            });
            ws.set_onclose(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
        }

        client.borrow_mut().socket = Some(ws);
    }

    fn schedule_reconnect(client: &Rc<RefCell<Client>>) {
        if client.borrow().reconnect.is_armed() {
            return;
        }
        let Some(window) = web_sys::window() else { return };

        let target = client.clone();
        let closure = Closure::once(move || {
            target.borrow_mut().reconnect.fired();
            connect(&target);
        });
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            RECONNECT_DELAY_MS,
        ) {
            Ok(handle) => {
                if let Err(extra) = client.borrow_mut().reconnect.arm(handle) {
                    window.clear_timeout_with_handle(extra);
                    return;
                }
                log::info!("Reconnecting in {RECONNECT_DELAY_MS} ms");
            }
            Err(err) => log::warn!("Could not schedule reconnect: {err:?}"),
        }
        closure.forget();
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, client: &Rc<RefCell<Client>>) {
        // Keyboard
        if let Some(window) = web_sys::window() {
            let client = client.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if key.eq_ignore_ascii_case("m") {
                    client.borrow_mut().toggle_mute();
                    return;
                }
                if let Some(cmd) = ClientCommand::from_key(&key) {
                    event.prevent_default();
                    client.borrow().send(cmd);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Tap on the board: start or restart
        {
            let client = client.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let c = client.borrow();
                if let Some(cmd) = c.engine.overlay_action() {
                    c.send(cmd);
                }
            });
            let _ = canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let client = client.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let c = client.borrow();
                if let Some(cmd) = c.engine.overlay_action() {
                    c.send(cmd);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(client: Rc<RefCell<Client>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            render_loop(client);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn render_loop(client: Rc<RefCell<Client>>) {
        {
            let mut c = client.borrow_mut();
            let Client {
                engine, surface, ..
            } = &mut *c;
            // Same clock as the network path
            engine.tick(now_ms(), surface);
        }

        request_animation_frame(client);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    web_client::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod replay {
    //! Headless replay of a recorded session
    //!
    //! Input is JSON lines: either a bare snapshot per line (spaced
    //! `--interval` ms apart) or `{"at": ms, "state": {...}}` envelopes.
    //! Replay time starts at the first arrival, so recordings stamped with
    //! wall-clock milliseconds play the same as ones starting at zero.

    use std::collections::BTreeMap;
    use std::io::{BufRead, BufReader};
    use std::path::PathBuf;

    use clap::Parser;
    use serde_json::Value;

    use snake_presenter::audio::{AudioFeedback, RecordingPlayer};
    use snake_presenter::consts::CONFETTI_MAX_MS;
    use snake_presenter::persistence::{FileStore, KeyValueStore, MemoryStore};
    use snake_presenter::renderer::RecordingSurface;
    use snake_presenter::settings::QualityPreset;
    use snake_presenter::{BestScore, PresentationEngine, Settings, Snapshot, TransitionEvent};

    /// Replay a recorded snake session through the presentation engine
    #[derive(Parser, Debug)]
    #[command(version)]
    pub struct Options {
        /// JSON-lines recording, or `-` for stdin
        pub input: String,
        /// Spacing between lines that carry no `at` stamp
        #[arg(long, value_name = "MS", default_value_t = 50)]
        pub interval: u64,
        /// Render ticks per second of replay time
        #[arg(
            long,
            default_value_t = 60,
            value_parser = clap::value_parser!(u32).range(1..=1000)
        )]
        pub fps: u32,
        /// Persist the best score and settings under this directory
        #[arg(long, value_name = "DIR")]
        pub store: Option<PathBuf>,
        /// Quality preset (low, medium, high); overrides stored settings
        #[arg(long, value_parser = parse_quality)]
        pub quality: Option<QualityPreset>,
    }

    fn parse_quality(raw: &str) -> Result<QualityPreset, String> {
        QualityPreset::parse(raw).ok_or_else(|| format!("unknown preset {raw:?}"))
    }

    /// One recorded arrival
    fn split_envelope(value: Value, fallback_at: f64) -> (f64, Value) {
        match value {
            Value::Object(mut map) if map.contains_key("state") => {
                let at = map.get("at").and_then(Value::as_f64).unwrap_or(fallback_at);
                (at, map.remove("state").unwrap_or(Value::Null))
            }
            other => (fallback_at, other),
        }
    }

    fn event_name(event: &TransitionEvent) -> String {
        let debug = format!("{event:?}");
        debug
            .split([' ', '{', '('])
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Drives the engine with recorded arrivals and a fixed render cadence
    pub struct Replay {
        engine: PresentationEngine,
        surface: RecordingSurface,
        frame_ms: f64,
        interval_ms: f64,
        /// Time of the next render tick; unset until the first arrival
        next_frame: Option<f64>,
        last_at: f64,
        arrivals: usize,
        events: BTreeMap<String, usize>,
    }

    impl Replay {
        pub fn new(engine: PresentationEngine, fps: u32, interval_ms: u64) -> Self {
            Self {
                engine,
                surface: RecordingSurface::new(),
                frame_ms: 1000.0 / f64::from(fps.max(1)),
                interval_ms: interval_ms as f64,
                next_frame: None,
                last_at: 0.0,
                arrivals: 0,
                events: BTreeMap::new(),
            }
        }

        fn render_until(&mut self, until: f64) {
            let Some(mut next) = self.next_frame else { return };
            while next <= until {
                self.engine.tick(next, &mut self.surface);
                next += self.frame_ms;
            }
            self.next_frame = Some(next);
        }

        /// Apply one recorded line; bad lines are logged and skipped
        pub fn feed_line(&mut self, line_no: usize, line: &str) {
            if line.trim().is_empty() {
                return;
            }
            let value: Value = match serde_json::from_str(line) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("line {line_no}: {err}");
                    return;
                }
            };

            let fallback = if self.arrivals == 0 {
                0.0
            } else {
                self.last_at + self.interval_ms
            };
            let (at, state) = split_envelope(value, fallback);
            // Out-of-order stamps are clamped; replay time never runs backwards
            let at = if self.arrivals == 0 {
                at
            } else {
                at.max(self.last_at)
            };
            self.last_at = at;
            self.arrivals += 1;

            self.next_frame.get_or_insert(at);
            self.render_until(at);

            match Snapshot::from_value(state) {
                Ok(snapshot) => {
                    for event in self.engine.on_snapshot(snapshot, at) {
                        log::info!("{at:>14.0} ms  {event:?}");
                        *self.events.entry(event_name(&event)).or_default() += 1;
                    }
                }
                Err(err) => log::warn!("line {line_no}: {err}"),
            }
        }

        /// Let the last effects play out
        pub fn finish(&mut self) {
            self.render_until(self.last_at + CONFETTI_MAX_MS);
        }

        pub fn arrivals(&self) -> usize {
            self.arrivals
        }

        pub fn frames(&self) -> u64 {
            self.surface.frames_presented
        }

        pub fn engine(&self) -> &PresentationEngine {
            &self.engine
        }

        fn log_summary(&self) {
            log::info!(
                "{} snapshots, {} frames, last frame {} commands",
                self.arrivals,
                self.frames(),
                self.surface.last.len()
            );
            for (name, count) in &self.events {
                log::info!("  {name}: {count}");
            }
            let persisted = if self.engine.best_is_persisted() {
                ""
            } else {
                " (not persisted)"
            };
            log::info!("best score {}{persisted}", self.engine.best_score());
            log::info!("available afterwards: {:?}", self.engine.available_commands());
        }
    }

    pub fn run(opts: Options) -> Result<(), String> {
        let reader: Box<dyn BufRead> = if opts.input == "-" {
            Box::new(BufReader::new(std::io::stdin()))
        } else {
            let file = std::fs::File::open(&opts.input)
                .map_err(|err| format!("cannot open {}: {err}", opts.input))?;
            Box::new(BufReader::new(file))
        };

        let store: Box<dyn KeyValueStore> = match &opts.store {
            Some(dir) => Box::new(FileStore::new(dir)),
            None => Box::new(MemoryStore::new()),
        };
        let settings = match opts.quality {
            Some(preset) => Settings::from_preset(preset),
            None => Settings::load(store.as_ref()),
        };
        log::info!("Quality preset: {}", settings.quality.as_str());

        let recorder = RecordingPlayer::new();
        let engine = PresentationEngine::new(
            settings,
            BestScore::load(store),
            AudioFeedback::new(Box::new(recorder.clone())),
            0,
        );
        let mut replay = Replay::new(engine, opts.fps, opts.interval);

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| format!("read error: {err}"))?;
            replay.feed_line(i + 1, &line);
        }
        replay.finish();

        replay.log_summary();
        log::info!("{} audio cues", recorder.cues().len());
        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::init();
    let opts = replay::Options::parse();
    log::info!("Snake Presenter (native replay) starting...");

    match replay::run(opts) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(msg) => {
            log::error!("{msg}");
            std::process::ExitCode::FAILURE
        }
    }
}
