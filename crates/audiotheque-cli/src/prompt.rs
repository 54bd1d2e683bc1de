// SPDX-License-Identifier: GPL-3.0-or-later

//! Terminal prompts.
//!
//! Menus are driven with the arrow keys and Enter. Esc or Ctrl-C inside any
//! prompt cancels it, which the run treats as a stop.

use std::io::{self, Stdout, Write};
use std::path::Path;

use audiotheque_application::{
    candidate_label, CandidateChoice, Decision, Interaction, InteractionResult, ReviewAction,
    Suggestion,
};
use audiotheque_domain::{CandidateRecord, RunSummary, TrackFields};
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Up,
    Down,
    Enter,
    Cancel,
    Backspace,
    Char(char),
}

fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Cancel),
        KeyCode::Esc => Some(Key::Cancel),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}

fn next_key() -> io::Result<Key> {
    loop {
        if let Event::Key(key) = event::read()? {
            if let Some(key) = map_key(key) {
                return Ok(key);
            }
        }
    }
}

/// Raw mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Wrapping cursor movement over `len` entries.
fn move_selection(selected: usize, len: usize, up: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if up {
        (selected + len - 1) % len
    } else {
        (selected + 1) % len
    }
}

fn decided<T>(answer: Option<T>) -> Decision<T> {
    match answer {
        Some(value) => Decision::Chosen(value),
        None => Decision::Cancelled,
    }
}

/// Candidates first, then the fixed controls.
fn choice_for_index(index: usize, candidates: usize) -> Option<CandidateChoice> {
    if index < candidates {
        Some(CandidateChoice::Candidate(index))
    } else {
        CandidateChoice::CONTROLS.get(index - candidates).copied()
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn describe(suggestion: &Suggestion) -> Vec<String> {
    let candidate = &suggestion.candidate;
    vec![
        format!("  Suggested metadata ({}):", candidate.provenance),
        format!("    Title:  {}", or_dash(&candidate.title)),
        format!("    Artist: {}", or_dash(&candidate.artist)),
        format!("    Album:  {}", or_dash(&candidate.album)),
        format!("    Year:   {}", or_dash(&candidate.year)),
        format!("    Track:  {}", or_dash(&candidate.track_number)),
        format!(
            "    Cover:  {}",
            if suggestion.artwork.is_some() { "found" } else { "none" }
        ),
    ]
}

fn report_lines(summary: &RunSummary) -> Vec<String> {
    vec![
        "Run summary".to_string(),
        format!("  Audio files found:      {}", summary.total_found),
        format!("  Already tagged:         {}", summary.already_tagged),
        format!("  Updated:                {}", summary.updated),
        format!("  Skipped or failed:      {}", summary.skipped_or_errored()),
    ]
}

pub struct TerminalInteraction {
    out: Stdout,
}

impl TerminalInteraction {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }

    pub fn banner(&mut self, root: &Path) {
        println!("Audiotheque: identify and tag your music library");
        println!();
        println!("  Library: {}", root.display());
        println!();
        println!("  WARNING: tags are rewritten in place. Back up your library first.");
        println!("  Arrow keys and Enter choose; Esc or Ctrl-C stops.");
        println!();
    }

    pub fn confirm_start(&mut self) -> io::Result<Decision<bool>> {
        self.confirm("Start processing?", false).map(decided)
    }

    pub fn final_report(&mut self, summary: &RunSummary) {
        println!();
        for line in report_lines(summary) {
            println!("{}", line);
        }
    }

    fn select(&mut self, title: &str, options: &[String]) -> io::Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }
        println!("{}", title);

        let _raw = RawMode::enable()?;
        let mut selected = 0;
        self.render_options(options, selected)?;

        loop {
            match next_key()? {
                Key::Up => selected = move_selection(selected, options.len(), true),
                Key::Down => selected = move_selection(selected, options.len(), false),
                Key::Enter => return Ok(Some(selected)),
                Key::Cancel => return Ok(None),
                _ => continue,
            }
            queue!(
                self.out,
                MoveUp(options.len() as u16),
                Clear(ClearType::FromCursorDown)
            )?;
            self.render_options(options, selected)?;
        }
    }

    fn render_options(&mut self, options: &[String], selected: usize) -> io::Result<()> {
        for (index, option) in options.iter().enumerate() {
            let marker = if index == selected { ">" } else { " " };
            queue!(self.out, MoveToColumn(0), Print(format!("  {} {}\r\n", marker, option)))?;
        }
        self.out.flush()
    }

    fn read_line(&mut self, label: &str, default: &str) -> io::Result<Option<String>> {
        let _raw = RawMode::enable()?;
        let mut buffer = default.to_string();

        loop {
            queue!(
                self.out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                Print(format!("  {}: {}", label, buffer))
            )?;
            self.out.flush()?;

            match next_key()? {
                Key::Enter => {
                    queue!(self.out, Print("\r\n"))?;
                    self.out.flush()?;
                    return Ok(Some(buffer.trim().to_string()));
                }
                Key::Cancel => {
                    queue!(self.out, Print("\r\n"))?;
                    self.out.flush()?;
                    return Ok(None);
                }
                Key::Backspace => {
                    buffer.pop();
                }
                Key::Char(c) => buffer.push(c),
                Key::Up | Key::Down => {}
            }
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> io::Result<Option<bool>> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let _raw = RawMode::enable()?;
        queue!(self.out, MoveToColumn(0), Print(format!("{} {} ", question, hint)))?;
        self.out.flush()?;

        let answer = loop {
            match next_key()? {
                Key::Char('y') | Key::Char('Y') => break Some(true),
                Key::Char('n') | Key::Char('N') => break Some(false),
                Key::Enter => break Some(default),
                Key::Cancel => break None,
                _ => {}
            }
        };

        let echo = match answer {
            Some(true) => "yes",
            Some(false) => "no",
            None => "cancelled",
        };
        queue!(self.out, Print(format!("{}\r\n", echo)))?;
        self.out.flush()?;
        Ok(answer)
    }
}

impl Interaction for TerminalInteraction {
    fn file_header(&mut self, position: usize, total: usize, relative_path: &Path) {
        println!();
        println!("--- File {}/{}: {} ---", position, total, relative_path.display());
    }

    fn notice(&mut self, message: &str) {
        println!("  {}", message);
    }

    fn choose_candidate(
        &mut self,
        candidates: &[CandidateRecord],
    ) -> InteractionResult<CandidateChoice> {
        let mut options: Vec<String> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| format!("{}. {}", index + 1, candidate_label(candidate)))
            .collect();
        options.extend(CandidateChoice::CONTROLS.iter().map(|choice| choice.to_string()));

        let picked = self.select("  Several recordings match. Pick one:", &options)?;
        Ok(decided(
            picked.and_then(|index| choice_for_index(index, candidates.len())),
        ))
    }

    fn review(&mut self, suggestion: Option<&Suggestion>) -> InteractionResult<ReviewAction> {
        match suggestion {
            Some(suggestion) => {
                for line in describe(suggestion) {
                    println!("{}", line);
                }
            }
            None => println!("  No suggestion could be found for this file."),
        }

        let actions = ReviewAction::offered(suggestion.is_some());
        let options: Vec<String> = actions.iter().map(ToString::to_string).collect();
        let picked = self.select("  What now?", &options)?;
        Ok(decided(picked.and_then(|index| actions.get(index).copied())))
    }

    fn edit_fields(
        &mut self,
        heading: &str,
        defaults: &TrackFields,
    ) -> InteractionResult<TrackFields> {
        println!("  {} (Enter keeps the shown value):", heading);

        let Some(title) = self.read_line("Title", &defaults.title)? else {
            return Ok(Decision::Cancelled);
        };
        let Some(artist) = self.read_line("Artist", &defaults.artist)? else {
            return Ok(Decision::Cancelled);
        };
        let Some(album) = self.read_line("Album", &defaults.album)? else {
            return Ok(Decision::Cancelled);
        };
        let Some(year) = self.read_line("Year", &defaults.year)? else {
            return Ok(Decision::Cancelled);
        };

        Ok(Decision::Chosen(TrackFields {
            title,
            artist,
            album,
            year,
            track_number: defaults.track_number.clone(),
        }))
    }

    fn keep_artwork(&mut self) -> InteractionResult<bool> {
        Ok(decided(self.confirm("  Embed the fetched cover art?", true)?))
    }

    fn confirm_continue_after_error(&mut self, message: &str) -> InteractionResult<bool> {
        println!("  {}", message);
        Ok(decided(self.confirm("  Continue with the next file?", true)?))
    }
}
