//! Guided chart session.
//!
//! Walks a chart's answer key slide by slide. The result is the last slide
//! read correctly; two wrong answers in a row end the session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Consecutive wrong answers that stop a session.
pub const STOP_AFTER_WRONG: u8 = 2;

const VA_BOTH: [&str; 14] = [
    "T", "R", "R", "L", "T", "B", "L", "R", "L", "B", "R", "B", "T", "R",
];
const VA_RIGHT: [&str; 14] = [
    "T", "L", "T", "T", "B", "B", "L", "B", "R", "T", "R", "L", "B", "R",
];
const VA_LEFT: [&str; 14] = [
    "L", "R", "L", "B", "R", "T", "T", "B", "R", "T", "B", "R", "T", "L",
];
const STEREO: [&str; 9] = ["B", "L", "B", "T", "T", "L", "R", "L", "R"];
const COLOR: [&str; 6] = ["12", "5", "26", "6", "16", "x"];

/// A chart with a fixed answer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chart {
    FarVaBoth,
    FarVaRight,
    FarVaLeft,
    FarStereo,
    FarColor,
    NearVaBoth,
    NearVaRight,
    NearVaLeft,
}

impl Chart {
    pub const ALL: [Chart; 8] = [
        Chart::FarVaBoth,
        Chart::FarVaRight,
        Chart::FarVaLeft,
        Chart::FarStereo,
        Chart::FarColor,
        Chart::NearVaBoth,
        Chart::NearVaRight,
        Chart::NearVaLeft,
    ];

    /// Expected answer for each slide, slide 1 first.
    pub fn answer_key(self) -> &'static [&'static str] {
        match self {
            Chart::FarVaBoth | Chart::NearVaBoth => &VA_BOTH,
            Chart::FarVaRight | Chart::NearVaRight => &VA_RIGHT,
            Chart::FarVaLeft | Chart::NearVaLeft => &VA_LEFT,
            Chart::FarStereo => &STEREO,
            Chart::FarColor => &COLOR,
        }
    }

    pub fn slides(self) -> u8 {
        // answer keys hold at most 14 slides
        self.answer_key().len() as u8
    }

    pub fn key(self) -> &'static str {
        match self {
            Chart::FarVaBoth => "far_va_both",
            Chart::FarVaRight => "far_va_right",
            Chart::FarVaLeft => "far_va_left",
            Chart::FarStereo => "far_stereo",
            Chart::FarColor => "far_color",
            Chart::NearVaBoth => "near_va_both",
            Chart::NearVaRight => "near_va_right",
            Chart::NearVaLeft => "near_va_left",
        }
    }

    /// Prompt shown to the technician for this chart.
    pub fn prompt(self) -> &'static str {
        match self {
            Chart::FarStereo => "Which circle stands out? (T/B/L/R)",
            Chart::FarColor => "Number seen on the plate (x if none)",
            _ => "Which side is the gap on? (T/B/L/R)",
        }
    }
}

impl fmt::Display for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Chart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Chart::ALL
            .into_iter()
            .find(|c| c.key() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Chart::ALL.iter().map(|c| c.key()).collect();
                format!("unknown chart: {s} (expected one of {})", known.join(", "))
            })
    }
}

/// Where the session stands after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the answer to `slide`.
    InProgress { slide: u8 },
    /// Stopped after consecutive wrong answers.
    Stopped,
    /// Every slide was shown.
    Completed,
}

impl SessionState {
    pub fn is_finished(self) -> bool {
        !matches!(self, SessionState::InProgress { .. })
    }
}

/// State of one guided chart walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSession {
    chart: Chart,
    slide: u8,
    last_passed: Option<u8>,
    wrong_streak: u8,
    state: SessionState,
}

impl ChartSession {
    pub fn new(chart: Chart) -> Self {
        Self {
            chart,
            slide: 1,
            last_passed: None,
            wrong_streak: 0,
            state: SessionState::InProgress { slide: 1 },
        }
    }

    pub fn chart(&self) -> Chart {
        self.chart
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Slide awaiting an answer, or `None` once finished.
    pub fn current_slide(&self) -> Option<u8> {
        match self.state {
            SessionState::InProgress { slide } => Some(slide),
            _ => None,
        }
    }

    /// Last slide read correctly.
    pub fn result(&self) -> Option<u8> {
        self.last_passed
    }

    /// Record the response for the current slide. Answers after the session
    /// finished are ignored.
    pub fn answer(&mut self, response: &str) -> SessionState {
        let SessionState::InProgress { slide } = self.state else {
            return self.state;
        };

        let expected = self.chart.answer_key()[usize::from(slide - 1)];
        let correct = response.trim().eq_ignore_ascii_case(expected);
        if correct {
            self.last_passed = Some(slide);
            self.wrong_streak = 0;
        } else {
            self.wrong_streak += 1;
        }

        tracing::debug!(chart = %self.chart, slide, correct, "chart answer");

        self.state = if self.wrong_streak >= STOP_AFTER_WRONG {
            SessionState::Stopped
        } else if slide >= self.chart.slides() {
            SessionState::Completed
        } else {
            self.slide = slide + 1;
            SessionState::InProgress { slide: self.slide }
        };
        self.state
    }
}
