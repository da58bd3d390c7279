//! Chaos Jump entry point
//!
//! On wasm32 this wires the canvas, keyboard/touch input and LocalStorage to
//! a [`Session`](chaos_jump::Session). Natively it plays a headless autopilot
//! round and prints the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, TouchEvent};

    use chaos_jump::error::StoreError;
    use chaos_jump::leaderboard::{DEFAULT_LEADERBOARD_SIZE, Leaderboard, LeaderboardEntry};
    use chaos_jump::persistence::{
        LeaderboardSource, LocalStorageStore, MemoryStore, PlayerProfile, ProfileStore,
    };
    use chaos_jump::render::{FrameView, RenderSink, css_color};
    use chaos_jump::session::ProfileLoad;
    use chaos_jump::sim::{GameEvent, PlatformKind, TickInput};
    use chaos_jump::{GameLoop, LoopControl, ReviveStatus, Session, SessionPhase, Settings};

    const ACCOUNT_KEY: &str = "chaos_jump_account";
    const DEFAULT_ACCOUNT: &str = "player@local";
    /// Frames the chaos banner stays up
    const ALERT_FRAMES: u32 = 90;

    /// LocalStorage when available, memory otherwise
    enum Store {
        Local(LocalStorageStore),
        Memory(MemoryStore),
    }

    impl ProfileStore for Store {
        fn load_profile(&self, id: &str) -> Result<PlayerProfile, StoreError> {
            match self {
                Store::Local(s) => s.load_profile(id),
                Store::Memory(s) => s.load_profile(id),
            }
        }

        fn save_profile(&mut self, id: &str, profile: &PlayerProfile) -> Result<(), StoreError> {
            match self {
                Store::Local(s) => s.save_profile(id, profile),
                Store::Memory(s) => s.save_profile(id, profile),
            }
        }
    }

    impl LeaderboardSource for Store {
        fn top_scores(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
            match self {
                Store::Local(s) => s.top_scores(n),
                Store::Memory(s) => s.top_scores(n),
            }
        }
    }

    /// Canvas 2D painter
    struct CanvasSink {
        ctx: CanvasRenderingContext2d,
        alert: Option<(String, u32)>,
    }

    impl CanvasSink {
        fn text(&self, text: &str, x: f64, y: f64, font: &str, color: &str) {
            self.ctx.set_font(font);
            self.ctx.set_fill_style_str(color);
            let _ = self.ctx.fill_text(text, x, y);
        }

        fn circle(&self, x: f64, y: f64, r: f64, color: &str) {
            self.ctx.set_fill_style_str(color);
            self.ctx.begin_path();
            let _ = self.ctx.arc(x, y, r, 0.0, TAU);
            self.ctx.fill();
        }
    }

    impl RenderSink for CanvasSink {
        fn draw(&mut self, view: &FrameView<'_>) {
            let ctx = &self.ctx;
            let state = view.state;
            let vp = view.viewport;
            let t = state.game_time_ms;

            ctx.set_fill_style_str("#1a1a2e");
            ctx.fill_rect(0.0, 0.0, vp.width as f64, vp.height as f64);

            for splat in &state.splats {
                let alpha = 1.0 - splat.progress() as f64;
                ctx.set_global_alpha(alpha);
                let at = view.to_screen(splat.pos);
                let rx = splat.width as f64 / 2.0 * (0.6 + 0.4 * splat.progress() as f64);
                ctx.set_fill_style_str(&css_color(splat.color));
                ctx.begin_path();
                let _ = ctx.ellipse(at.x as f64, at.y as f64, rx, 4.0, 0.0, 0.0, TAU);
                ctx.fill();
                for drop in &splat.droplets {
                    let p = view.to_screen(drop.pos);
                    self.circle(p.x as f64, p.y as f64, drop.radius as f64, &css_color(splat.color));
                }
            }
            ctx.set_global_alpha(1.0);

            for platform in &state.platforms {
                if !view.is_visible(platform.top(), platform.bottom()) {
                    continue;
                }
                let wobble = ((platform.phase as f64) + t / 300.0).sin() * 1.5;
                let p = view.to_screen(platform.pos);
                let (x, y) = (p.x as f64, p.y as f64 + wobble);
                ctx.set_fill_style_str(&css_color(platform.kind.color()));
                ctx.fill_rect(x, y, platform.width as f64, platform.height as f64);

                if platform.kind == PlatformKind::Spike {
                    ctx.begin_path();
                    let mut sx = x;
                    while sx + 10.0 <= x + platform.width as f64 {
                        ctx.move_to(sx, y);
                        ctx.line_to(sx + 5.0, y - 8.0);
                        ctx.line_to(sx + 10.0, y);
                        sx += 10.0;
                    }
                    ctx.fill();
                }
            }

            for coin in &state.coins {
                let r = coin.size as f64 / 2.0;
                let p = view.to_screen(coin.pos);
                self.circle(p.x as f64 + r, p.y as f64 + r, r, "#ffd700");
            }

            // Squash toward the surface the player bounces off
            let player = &state.player;
            let scale = player.squish_scale();
            let (w, h) = (
                (player.size.x * scale.x) as f64,
                (player.size.y * scale.y) as f64,
            );
            let p = view.to_screen(player.pos);
            let x = p.x as f64 + (player.size.x as f64 - w) / 2.0;
            let y = if state.chaos.mode.is_flipped() {
                p.y as f64
            } else {
                p.y as f64 + player.size.y as f64 - h
            };
            ctx.set_fill_style_str(&css_color(player.color));
            ctx.fill_rect(x, y, w, h);
            self.circle(x + w * 0.3, y + h * 0.35, 5.0, "#ffffff");
            self.circle(x + w * 0.7, y + h * 0.35, 5.0, "#ffffff");

            let hud = &view.hud;
            self.text(&format!("{}m", hud.height_m), 10.0, 24.0, "bold 20px sans-serif", "#ffffff");
            self.text(&format!("Coins: {}", hud.round_coins), 10.0, 46.0, "14px sans-serif", "#ffd700");
            if let Some(hearts) = hud.hearts {
                self.text(&format!("Hearts: {}", hearts), 10.0, 64.0, "14px sans-serif", "#ff6b6b");
            }
            self.text(
                &format!("{} {}s", hud.chaos_mode.as_str(), hud.chaos_countdown_s),
                vp.width as f64 - 150.0,
                24.0,
                "14px sans-serif",
                &css_color(hud.chaos_mode.color()),
            );

            if let Some((text, frames)) = self.alert.take() {
                self.text(&text, 60.0, vp.height as f64 / 3.0, "bold 28px sans-serif", "#ffffff");
                if frames > 1 {
                    self.alert = Some((text, frames - 1));
                }
            }
        }

        fn notify(&mut self, event: &GameEvent) {
            if let GameEvent::ChaosChanged { mode } = event {
                self.alert = Some((mode.alert_text().to_string(), ALERT_FRAMES));
            }
        }
    }

    struct Game {
        session: Session,
        game_loop: GameLoop,
        store: Store,
        sink: CanvasSink,
        input: TickInput,
        /// An animation frame is scheduled
        looping: bool,
        message: Option<String>,
    }

    impl Game {
        fn report<T>(&mut self, result: chaos_jump::Result<T>) {
            if let Err(err) = result {
                log::warn!("{}", err);
                // The overlay is hidden mid-round, so flash it as a banner too
                if self.session.is_running() {
                    self.sink.alert = Some((err.to_string(), ALERT_FRAMES));
                }
                self.message = Some(err.to_string());
            } else {
                self.message = None;
            }
        }

        /// Enter / Space / tap
        fn primary_action(&mut self) {
            let result = match self.session.phase() {
                SessionPhase::Idle => self.session.start(js_sys::Date::now() as u64),
                SessionPhase::Paused => self.session.resume(),
                SessionPhase::Ended { .. } => self.session.revive(&mut self.store),
                SessionPhase::Running => Ok(()),
            };
            self.report(result);
        }

        fn buy_heart(&mut self) {
            let result = self.session.buy_heart(&mut self.store);
            self.report(result);
        }

        fn back_action(&mut self) {
            let result = match self.session.phase() {
                SessionPhase::Running => self.session.pause(),
                SessionPhase::Paused | SessionPhase::Ended { .. } => {
                    self.session.exit_to_menu(&mut self.store)
                }
                SessionPhase::Idle => Ok(()),
            };
            self.report(result);
        }

        fn draw_overlay(&self) {
            let vp = self.session.settings().viewport;
            let (w, h) = (vp.width as f64, vp.height as f64);
            let ctx = &self.sink.ctx;
            ctx.set_global_alpha(0.75);
            ctx.set_fill_style_str("#000000");
            ctx.fill_rect(0.0, 0.0, w, h);
            ctx.set_global_alpha(1.0);

            let mut lines: Vec<String> = Vec::new();
            match self.session.phase() {
                SessionPhase::Idle => {
                    lines.push("CHAOS JUMP".into());
                    if let Some(p) = self.session.profile() {
                        lines.push(format!(
                            "Coins {}  Hearts {}  Best {}m",
                            p.total_coins, p.hearts, p.max_height
                        ));
                    }
                    lines.push("Enter: play   H: buy heart".into());
                    let board = Leaderboard::fetch(&self.store, DEFAULT_LEADERBOARD_SIZE);
                    for (i, e) in board.entries.iter().take(5).enumerate() {
                        lines.push(format!("{}. {} {}m", i + 1, e.display_name, e.max_height));
                    }
                }
                SessionPhase::Paused => {
                    lines.push("PAUSED".into());
                    lines.push("Enter: resume   Esc: menu".into());
                }
                SessionPhase::Ended { revive } => {
                    lines.push("GAME OVER".into());
                    lines.push(format!("{}m", self.session.height_meters()));
                    match revive {
                        ReviveStatus::Available => lines.push("Enter: revive (1 heart)".into()),
                        ReviveStatus::Exhausted(block) => lines.push(block.to_string()),
                    }
                    lines.push("Esc: bank coins and exit".into());
                }
                SessionPhase::Running => {}
            }
            if let Some(msg) = &self.message {
                lines.push(msg.clone());
            }

            for (i, line) in lines.iter().enumerate() {
                self.sink
                    .text(line, 30.0, h / 3.0 + i as f64 * 26.0, "18px sans-serif", "#ffffff");
            }
        }
    }

    fn load_account() -> String {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .and_then(|s| s.get_item(ACCOUNT_KEY).ok().flatten())
            .unwrap_or_else(|| DEFAULT_ACCOUNT.to_string())
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Chaos Jump starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let settings = Settings::load();
        canvas.set_width(settings.viewport.width as u32);
        canvas.set_height(settings.viewport.height as u32);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let mut store = match LocalStorageStore::open() {
            Ok(store) => Store::Local(store),
            Err(err) => {
                log::warn!("{}; progress will not be saved", err);
                Store::Memory(MemoryStore::new())
            }
        };

        let mut session =
            Session::new(settings).map_err(|err| JsValue::from_str(&err.to_string()))?;
        let message = match session.sign_in(&load_account(), &mut store) {
            ProfileLoad::Fallback(err) => Some(format!("Progress will not be saved: {}", err)),
            ProfileLoad::Loaded | ProfileLoad::Created => None,
        };

        let game = Rc::new(RefCell::new(Game {
            session,
            game_loop: GameLoop::new(),
            store,
            sink: CanvasSink { ctx, alert: None },
            input: TickInput::default(),
            looping: false,
            message,
        }));

        setup_keyboard(game.clone());
        setup_touch(&canvas, game.clone());
        setup_auto_pause(game.clone());

        game.borrow().draw_overlay();
        log::info!("Chaos Jump ready");
        Ok(())
    }

    /// Kick the frame loop if the session just entered `Running`
    fn ensure_looping(game: &Rc<RefCell<Game>>) {
        let start = {
            let mut g = game.borrow_mut();
            if g.session.is_running() && !g.looping {
                g.looping = true;
                g.game_loop.restart();
                true
            } else {
                false
            }
        };
        if start {
            request_animation_frame(game.clone());
        } else if !game.borrow().session.is_running() {
            game.borrow().draw_overlay();
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                {
                    let mut g = game.borrow_mut();
                    match event.key().as_str() {
                        "ArrowLeft" | "a" | "A" => g.input.move_left = true,
                        "ArrowRight" | "d" | "D" => g.input.move_right = true,
                        " " | "Enter" => g.primary_action(),
                        "Escape" | "p" | "P" => g.back_action(),
                        "h" | "H" => g.buy_heart(),
                        "i" | "I" => {
                            g.input.autopilot = !g.input.autopilot;
                            log::info!("Autopilot: {}", g.input.autopilot);
                        }
                        _ => return,
                    }
                }
                ensure_looping(&game);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.input.move_left = false,
                    "ArrowRight" | "d" | "D" => g.input.move_right = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Left half of the canvas steers left, right half steers right
    fn setup_touch(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        for name in ["touchstart", "touchmove"] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let rect = canvas_clone.get_bounding_client_rect();
                let x = touch.client_x() as f64 - rect.left();
                {
                    let mut g = game.borrow_mut();
                    if !g.session.is_running() {
                        if event.type_() == "touchstart" {
                            g.primary_action();
                        }
                    } else {
                        let left = x < rect.width() / 2.0;
                        g.input.move_left = left;
                        g.input.move_right = !left;
                    }
                }
                ensure_looping(&game);
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
            let mut g = game.borrow_mut();
            g.input.move_left = false;
            g.input.move_right = false;
        });
        let _ = canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let control = {
            let mut g = game.borrow_mut();
            let Game {
                session,
                game_loop,
                sink,
                input,
                ..
            } = &mut *g;
            game_loop.frame(session, time, input, sink)
        };

        match control {
            LoopControl::Continue => request_animation_frame(game),
            LoopControl::Stop => {
                let mut g = game.borrow_mut();
                g.looping = false;
                // Keys held at death must not steer the revived round
                g.input.release();
                g.draw_overlay();
            }
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.session.is_running() {
                        let result = g.session.pause();
                        g.report(result);
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.session.is_running() {
                    let result = g.session.pause();
                    g.report(result);
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use chaos_jump::leaderboard::{DEFAULT_LEADERBOARD_SIZE, Leaderboard};
    use chaos_jump::persistence::MemoryStore;
    use chaos_jump::render::NullSink;
    use chaos_jump::sim::TickInput;
    use chaos_jump::{GameError, GameLoop, LoopControl, Session, SessionPhase, Settings};

    env_logger::init();
    log::info!("Chaos Jump (native) starting...");
    log::info!("Native mode plays a headless autopilot round - build for wasm32 to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);

    let mut session = match Session::new(Settings::default()) {
        Ok(session) => session,
        Err(err) => {
            log::error!("Invalid settings: {}", err);
            return;
        }
    };
    let mut store = MemoryStore::new();
    session.sign_in("autopilot@local", &mut store);
    if let Err(err) = session.start(seed) {
        log::error!("{}", err);
        return;
    }

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut game_loop = GameLoop::new();
    let mut sink = NullSink;
    let frame_ms = 1000.0 / 60.0;
    // Two minutes of play at most
    let max_frames = 60 * 120;
    let mut time = 0.0;

    for _ in 0..max_frames {
        time += frame_ms;
        if game_loop.frame(&mut session, time, &input, &mut sink) == LoopControl::Continue {
            continue;
        }
        // Spend the revive if one is on offer
        match session.revive(&mut store) {
            Ok(()) => {}
            Err(GameError::Store(err)) => log::warn!("Revived, but {}", err),
            Err(_) => break,
        }
        game_loop.restart();
    }

    if session.is_running() {
        let _ = session.end();
    }
    let height = session.height_meters();
    let coins = session.simulation().round_coins;
    if matches!(session.phase(), SessionPhase::Ended { .. }) {
        if let Err(err) = session.exit_to_menu(&mut store) {
            log::warn!("{}", err);
        }
    }

    println!("\nSeed {}: reached {}m, collected {} coins", seed, height, coins);
    println!("Revives used: {}", session.revives_used());
    println!("Game time: {:.1}s over {} frames", time / 1000.0, game_loop.frame_count());

    let board = Leaderboard::fetch(&store, DEFAULT_LEADERBOARD_SIZE);
    for (i, entry) in board.entries.iter().enumerate() {
        println!("{:>2}. {:<12} {}m", i + 1, entry.display_name, entry.max_height);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
