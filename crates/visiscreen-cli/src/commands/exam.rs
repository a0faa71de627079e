//! The `visiscreen exam` command.

use std::io::{BufRead, Write};

use anyhow::Result;

use visiscreen_core::exam::{Chart, ChartSession, SessionState, STOP_AFTER_WRONG};
use visiscreen_core::model::{format_stereo, format_va, StereoCode, VaCode};

pub fn execute(chart: String, answers: Option<String>) -> Result<()> {
    let chart: Chart = chart.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let mut session = ChartSession::new(chart);

    println!("Chart: {chart} ({} slides)", chart.slides());
    println!("{}", chart.prompt());

    match answers {
        Some(list) => {
            for response in list.split(',') {
                if !step(&mut session, response.trim()) {
                    break;
                }
            }
        }
        None => {
            let stdin = std::io::stdin();
            let mut lines = stdin.lock().lines();
            while let Some(slide) = session.current_slide() {
                print!("Slide {slide}> ");
                std::io::stdout().flush()?;
                let Some(line) = lines.next() else { break };
                let line = line?;
                if !step(&mut session, line.trim()) {
                    break;
                }
            }
            println!();
        }
    }

    match session.state() {
        SessionState::Stopped => {
            println!("Stopped after {STOP_AFTER_WRONG} consecutive wrong answers.")
        }
        SessionState::Completed => println!("All slides shown."),
        SessionState::InProgress { slide } => {
            println!("Session incomplete: no answer for slide {slide}.")
        }
    }
    println!("Result: {}", describe_result(chart, session.result()));

    Ok(())
}

/// Feed one answer; returns whether the session still wants more.
fn step(session: &mut ChartSession, response: &str) -> bool {
    let Some(slide) = session.current_slide() else {
        return false;
    };
    let state = session.answer(response);
    let verdict = if session.result() == Some(slide) {
        "correct"
    } else {
        "wrong"
    };
    println!("  slide {slide}: {response} ({verdict})");
    !state.is_finished()
}

/// Render the last slide read correctly on the chart's own scale.
fn describe_result(chart: Chart, result: Option<u8>) -> String {
    let Some(n) = result else {
        return "no slide read correctly".to_string();
    };
    match chart {
        Chart::FarStereo => format_stereo(StereoCode::new(n).ok()),
        Chart::FarColor => format!("{n}/{} plates", chart.slides()),
        _ => format_va(VaCode::new(n).ok()),
    }
}
