//! Software-rendered view using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬──────────────┐
//! │  GESTURE: FORWARD                            │  MODE        │
//! │                                              │  HANDS       │
//! │        (hand skeletons, mirrored view)       │   R 11111    │
//! │                                              │   L 00000    │
//! │                                              │  SENT        │
//! │                                              │  COUNTS      │
//! │  status bar                                  │              │
//! └──────────────────────────────────────────────┴──────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{anyhow, Result};
use gesture_core::landmark::HAND_CONNECTIONS;
use gesture_core::{Command, DetectedHand, Finger, FingerState, Handedness, ResolverMode};
use gesture_link::PublishStats;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 960;
pub const WIN_H:     usize = 540;
const PANEL_W:       usize = 240;
const VIEW_W:        usize = WIN_W - PANEL_W;
const STATUS_Y:      usize = WIN_H - 36;
const BG_COLOR:      u32   = 0xFF101820;
const PANEL_BG:      u32   = 0xFF16213E;
const TEXT_BG:       u32   = 0xFF0F3460;
const RIGHT_COLOR:   u32   = 0xFF4FC3F7;
const LEFT_COLOR:    u32   = 0xFFFFB74D;
const JOINT_COLOR:   u32   = 0xFFFFFFFF;
const GESTURE_COLOR: u32   = 0xFF00FF00;  // matches the classic green overlay
const DIM_TEXT:      u32   = 0xFF888888;

/// Keys `1`–`5` drive the right hand, `6`–`0` the left, thumb first.
const RIGHT_KEYS: [Key; 5] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5];
const LEFT_KEYS:  [Key; 5] = [Key::Key6, Key::Key7, Key::Key8, Key::Key9, Key::Key0];

/// Everything one frame needs to draw.
pub struct View<'a> {
    pub hands:     &'a [DetectedHand],
    pub fingers:   &'a [(Handedness, FingerState)],
    pub label:     Option<Command>,
    pub command:   Command,
    pub last_sent: Option<Command>,
    pub stats:     PublishStats,
    pub mode:      ResolverMode,
    pub source:    &'a str,
    pub status:    &'a str,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    /// Present only in simulation mode.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self> {
        let mut window = Window::new(
            "Gesture-Based Direction",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| anyhow!("opening window: {}", e))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Poll the keyboard.  Returns `false` when the user wants out
    /// (`Q`, `Escape`, or the window was closed).
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            self.send(SimInput::Quit);
            return false;
        }
        if self.sim_tx.is_none() { return true; }

        let mut inputs = Vec::new();
        for (i, finger) in Finger::ALL.iter().enumerate() {
            if pressed(RIGHT_KEYS[i]) {
                inputs.push(SimInput::ToggleFinger(Handedness::Right, *finger));
            }
            if pressed(LEFT_KEYS[i]) {
                inputs.push(SimInput::ToggleFinger(Handedness::Left, *finger));
            }
        }
        if pressed(Key::R) { inputs.push(SimInput::ToggleHand(Handedness::Right)); }
        if pressed(Key::L) { inputs.push(SimInput::ToggleHand(Handedness::Left)); }

        for input in inputs {
            self.send(input);
        }
        true
    }

    fn send(&self, input: SimInput) {
        if let Some(tx) = &self.sim_tx {
            let _ = tx.send(input);
        }
    }

    /// Render one frame.
    pub fn render(&mut self, view: &View<'_>) {
        self.buf.fill(BG_COLOR);

        // ── Hands ─────────────────────────────────────────────────────────
        for hand in view.hands {
            self.draw_hand(hand);
        }

        // ── Gesture overlay ───────────────────────────────────────────────
        if let Some(label) = view.label {
            self.draw_label(&format!("GESTURE: {}", label), 10, 30, GESTURE_COLOR, 4);
        }

        // ── Side panel ────────────────────────────────────────────────────
        self.draw_panel(view);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, VIEW_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(view.status, 10, STATUS_Y + 8, 0xFFEEEEEE, 1);

        let legend = if self.sim_tx.is_some() {
            "1-5=right fingers  6-0=left fingers  R/L=show hand  Q=quit"
        } else {
            "Q or Esc=quit"
        };
        self.draw_label(legend, 10, WIN_H - 14, DIM_TEXT, 1);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &DetectedHand) {
        let color = match hand.handedness {
            Handedness::Right => RIGHT_COLOR,
            Handedness::Left  => LEFT_COLOR,
        };
        let to_px = |i: usize| {
            let p = hand.landmarks[i];
            (
                (p.x.clamp(0.0, 1.0) * (VIEW_W - 1) as f32) as isize,
                (p.y.clamp(0.0, 1.0) * (STATUS_Y - 1) as f32) as isize,
            )
        };

        for &(a, b) in HAND_CONNECTIONS.iter() {
            let (x0, y0) = to_px(a);
            let (x1, y1) = to_px(b);
            self.draw_line(x0, y0, x1, y1, color);
        }
        for i in 0..hand.landmarks.points().len() {
            let (x, y) = to_px(i);
            self.fill_square(x, y, 2, JOINT_COLOR);
        }

        let (wx, wy) = to_px(0);
        let tag = format!("{} {:.2}", hand.handedness, hand.score);
        self.draw_label(&tag, (wx - 20).max(0) as usize, (wy + 10).max(0) as usize, color, 2);
    }

    // ── Side panel ────────────────────────────────────────────────────────

    fn draw_panel(&mut self, view: &View<'_>) {
        let x = VIEW_W + 10;
        self.fill_rect(VIEW_W, 0, PANEL_W, WIN_H, PANEL_BG);

        let mode = match view.mode {
            ResolverMode::TwoHand       => "TWO HAND",
            ResolverMode::RightHandOnly => "RIGHT ONLY",
        };
        self.draw_label("MODE", x, 12, 0xFFFFD700, 2);
        self.draw_label(mode, x, 28, 0xFFEEEEEE, 2);

        self.draw_label("HANDS  T I M R P", x, 56, 0xFFFFD700, 2);
        let mut y = 74;
        if view.fingers.is_empty() {
            self.draw_label("none", x, y, DIM_TEXT, 2);
        }
        for (h, state) in view.fingers {
            let color = match h {
                Handedness::Right => RIGHT_COLOR,
                Handedness::Left  => LEFT_COLOR,
            };
            let bits: Vec<String> = state.0.iter().map(|&b| if b { "1" } else { "0" }.to_string()).collect();
            self.draw_label(&format!("{:<5}  {}", h, bits.join(" ")), x, y, color, 2);
            y += 16;
        }

        self.draw_label("COMMAND", x, 150, 0xFFFFD700, 2);
        self.draw_label(view.command.as_str(), x, 166, 0xFFEEEEEE, 2);

        self.draw_label("LAST SENT", x, 196, 0xFFFFD700, 2);
        let sent = view.last_sent.map(Command::as_str).unwrap_or("none");
        self.draw_label(sent, x, 212, GESTURE_COLOR, 2);

        self.draw_label("PUBLISHED", x, 242, 0xFFFFD700, 2);
        self.draw_label(&format!("{}", view.stats.published), x, 258, 0xFFEEEEEE, 2);
        self.draw_label("FAILED", x, 280, 0xFFFFD700, 2);
        self.draw_label(&format!("{}", view.stats.failed), x, 296, 0xFFEEEEEE, 2);
        self.draw_label("FRAMES", x, 318, 0xFFFFD700, 2);
        self.draw_label(&format!("{}", view.stats.submitted), x, 334, 0xFFEEEEEE, 2);

        self.draw_label(view.source, x, STATUS_Y + 8, DIM_TEXT, 1);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn fill_square(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                self.set_pixel_i(cx + dx, cy + dy, color);
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn set_pixel_i(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Bresenham line, two pixels thick.
    fn draw_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let (mut x, mut y) = (x0, y0);
        let dx =  (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel_i(x, y, color);
            self.set_pixel_i(x + 1, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Minimal bitmap font: 3×5 glyphs, each pixel drawn `scale`×`scale`.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '`' | '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}
