//! gesture_probe: type finger vectors, see what the resolver would send.

use gesture_core::{
    resolve, CommandLatch, FingerState, Handedness, ResolverMode, LEFT_ACTIONS, RIGHT_MOVEMENTS,
};
use std::io::{self, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║           Gesture Probe — finger vector resolver         ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let mode = if std::env::args().any(|a| a == "--right-only") {
        ResolverMode::RightHandOnly
    } else {
        ResolverMode::TwoHand
    };
    println!("  Mode: {:?}", mode);
    println!();
    print_tables();

    let mut latch = CommandLatch::new();
    let mut frame = 0usize;

    loop {
        println!("  Enter hands as `L 00000 R 01100` (thumb→pinky), empty for none,");
        println!("  `t` for tables, `q` to quit.");
        let Some(line) = read_line("  Frame: ") else { break };
        match line.trim() {
            "q" | "quit" => { println!("\n  Goodbye!\n"); break; }
            "t"          => { print_tables(); continue; }
            _            => {}
        }

        let hands = match parse_hands(&line) {
            Ok(h)  => h,
            Err(e) => { println!("  ⚠  {}\n", e); continue; }
        };

        frame += 1;
        let res = resolve(mode, &hands);
        let label = res.label.map(|c| c.as_str()).unwrap_or("");
        match latch.observe(res.command) {
            Some(c) => println!("  #{:<4} {:<10} label={:<10} → PUBLISH {}", frame, res.command, label, c),
            None    => println!("  #{:<4} {:<10} label={:<10}   (unchanged)", frame, res.command, label),
        }
        println!();
    }
}

fn parse_hands(line: &str) -> Result<Vec<(Handedness, FingerState)>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err("expected pairs of <hand> <pattern>".to_string());
    }
    tokens
        .chunks(2)
        .map(|pair| {
            let hand = match pair[0] {
                "L" | "l" => Handedness::Left,
                "R" | "r" => Handedness::Right,
                other     => other.parse().map_err(|e: gesture_core::GestureError| e.to_string())?,
            };
            let state = pair[1].parse().map_err(|e: gesture_core::GestureError| e.to_string())?;
            Ok((hand, state))
        })
        .collect()
}

fn print_tables() {
    println!("  Left hand (actions):");
    for (p, c) in LEFT_ACTIONS.iter() {
        println!("    {}  → {}", p, c);
    }
    println!("  Right hand (movement):");
    for (p, c) in RIGHT_MOVEMENTS.iter() {
        println!("    {}  → {}", p, c);
    }
    println!();
}

/// `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_)          => Some(buf),
    }
}
