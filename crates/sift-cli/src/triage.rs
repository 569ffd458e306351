//! Running a review session from the terminal.
//!
//! Script mode feeds a comma-separated intent list through the processor and
//! reports each transition. Interactive mode puts the terminal in raw mode,
//! reads keys on a blocking task and applies them on the async side:
//!
//! ```text
//!   spawn_blocking(read_keys) ──mpsc<KeyEvent>──▶ run_interactive
//!                                                   ├─ keys::action_for
//!                                                   ├─ Processor::dispatch / pump
//!                                                   └─ draw
//! ```

use std::io::{Stdout, Write};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyEvent};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use sift_engine::{
    ChromeRequest, DocumentService, Intent, NotificationReceiver, Processor, RequestHandle, Transition,
};
use sift_tree::BlockTree;
use sift_types::BlockId;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::keys::{self, KeyAction};
use crate::render;

/// Parse `start,hide,keep` into intents.
pub fn parse_script(script: &str) -> Result<Vec<Intent>> {
    script
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Intent::from_str(s).with_context(|| format!("unknown intent {s:?}")))
        .collect()
}

fn describe_transition(t: &Transition) -> String {
    let mut line = if t.applied {
        format!("{}: {} -> {}", t.intent, t.from, t.to)
    } else {
        format!("{}: ignored in {}", t.intent, t.from)
    };
    if let Some(collected) = &t.collected {
        line.push_str(&format!(" (summary of {} blocks)", collected.summary.len()));
    }
    line
}

/// Apply `intents` in order and return the report.
///
/// Each line is a transition or a notification; the final outline follows.
pub fn run_script<S: DocumentService>(
    processor: &mut Processor<BlockTree, S>,
    notices: &mut NotificationReceiver,
    intents: &[Intent],
    highlight_color: &str,
) -> Result<String> {
    let mut out = String::new();
    for &intent in intents {
        let t = processor.dispatch(intent)?;
        out.push_str(&describe_transition(&t));
        out.push('\n');
        while let Ok(notice) = notices.try_recv() {
            out.push_str(&format!("! {notice}\n"));
        }
    }
    out.push('\n');
    out.push_str(&render::outline(
        processor.tree().blocks(),
        processor.state(),
        highlight_color,
    ));
    Ok(out)
}

// ============================================================================
// Interactive
// ============================================================================

/// Raw mode plus alternate screen, undone on drop.
struct TerminalGuard {
    stdout: Stdout,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Forward key events until the receiver goes away.
fn read_keys(tx: mpsc::UnboundedSender<KeyEvent>) -> std::io::Result<()> {
    while !tx.is_closed() {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()?
            && tx.send(key).is_err()
        {
            break;
        }
    }
    Ok(())
}

/// Summary heading to keep in view after `transitions`.
///
/// A Collect pins its heading; any other applied intent unpins it.
fn pinned_heading(transitions: &[Transition], current: Option<BlockId>) -> Option<BlockId> {
    if let Some(collected) = transitions.iter().rev().find_map(|t| t.collected.as_ref()) {
        return Some(collected.heading.clone());
    }
    if transitions.iter().any(|t| t.applied) {
        return None;
    }
    current
}

/// Rows taken by the title and the status lines.
const CHROME_ROWS: usize = 5;

fn draw<S: DocumentService>(
    out: &mut Stdout,
    processor: &Processor<BlockTree, S>,
    title: &str,
    status: &str,
    pinned: Option<&BlockId>,
    highlight_color: &str,
) -> Result<()> {
    let phase = processor.session().phase();
    let roots = processor.tree().blocks();
    let (_, rows) = terminal::size()?;
    let height = (rows as usize).saturating_sub(CHROME_ROWS).max(1);

    let focus = pinned.or(processor.state().cursor());
    let body = render::outline(roots, processor.state(), highlight_color);
    let total = body.lines().count();
    let focus_line = focus.and_then(|id| render::line_of(roots, id));
    let start = render::scroll_offset(total, height, focus_line, pinned.is_some());

    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    queue!(out, Print(format!("{title} [{phase}]\r\n\r\n")))?;
    for line in body.lines().skip(start).take(height) {
        queue!(out, Print(line), Print("\r\n"))?;
    }
    queue!(out, Print("\r\n"), Print(keys::help_line(phase)), Print("\r\n"))?;
    if !status.is_empty() {
        queue!(out, Print(status), Print("\r\n"))?;
    }
    out.flush()?;
    Ok(())
}

fn send_request(handle: &RequestHandle, req: ChromeRequest) -> Result<()> {
    match req {
        ChromeRequest::Start => handle.request_start(),
        ChromeRequest::Cancel => handle.request_cancel(),
        ChromeRequest::UntoggleAll => handle.request_untoggle_all(),
    }?;
    Ok(())
}

/// Interactive review until the user quits.
pub async fn run_interactive<S: DocumentService>(
    mut processor: Processor<BlockTree, S>,
    mut notices: NotificationReceiver,
    title: &str,
    highlight_color: &str,
) -> Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let (tx, mut keys_rx) = mpsc::unbounded_channel();
    let reader = tokio::task::spawn_blocking(move || read_keys(tx));
    let handle = processor.handle();
    let mut status = String::new();
    let mut pinned: Option<BlockId> = None;

    info!(document = %processor.document().short(), "interactive triage started");
    draw(&mut guard.stdout, &processor, title, &status, None, highlight_color)?;

    while let Some(key) = keys_rx.recv().await {
        let Some(action) = keys::action_for(key, processor.session().phase()) else {
            continue;
        };
        debug!(?action, "key");
        match action {
            KeyAction::Quit => break,
            KeyAction::Dispatch(intent) => {
                let t = processor.dispatch(intent)?;
                status = if t.applied { String::new() } else { describe_transition(&t) };
                pinned = pinned_heading(std::slice::from_ref(&t), pinned);
            }
            KeyAction::Request(req) => {
                send_request(&handle, req)?;
                let transitions = processor.pump()?;
                status.clear();
                pinned = pinned_heading(&transitions, pinned);
            }
        }
        while let Ok(notice) = notices.try_recv() {
            status = notice.to_string();
        }
        draw(&mut guard.stdout, &processor, title, &status, pinned.as_ref(), highlight_color)?;
    }

    drop(keys_rx);
    match reader.await {
        Ok(result) => result.context("terminal input failed")?,
        Err(e) => bail!("key reader panicked: {e}"),
    }
    drop(guard);
    info!("interactive triage finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_engine::{EngineOptions, InMemoryDocuments};
    use sift_types::{Block, codec};

    fn processor(blocks: Vec<Block>) -> (Processor<BlockTree, InMemoryDocuments>, NotificationReceiver) {
        let mut svc = InMemoryDocuments::new();
        let content = codec::encode_document(&blocks).unwrap();
        let doc = svc.insert("test", &content);
        Processor::new(doc, BlockTree::new(blocks), svc, EngineOptions::default())
    }

    #[test]
    fn test_parse_script() {
        let intents = parse_script("start, hide,keep ,, prev,Collect").unwrap();
        assert_eq!(
            intents,
            vec![Intent::Start, Intent::Hide, Intent::Keep, Intent::Previous, Intent::Collect]
        );
        assert!(parse_script("start,jump").is_err());
    }

    #[test]
    fn test_script_reports_transitions_and_notices() {
        let (mut p, mut rx) = processor(vec![Block::paragraph("a", "one"), Block::paragraph("b", "two")]);
        let intents = parse_script("start,hide,keep,dismiss,collect").unwrap();
        let report = run_script(&mut p, &mut rx, &intents, "yellow").unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "start: idle -> active");
        assert_eq!(lines[1], "hide: active -> active");
        assert_eq!(lines[2], "keep: active -> review_complete");
        assert_eq!(lines[3], "! All done!");
        assert_eq!(lines[4], "dismiss: review_complete -> idle");
        assert_eq!(lines[5], "collect: ignored in idle");
        assert_eq!(lines[7], "   [hidden: 1]");
        assert_eq!(lines[8], "   two");
    }

    #[test]
    fn test_collect_pins_summary_heading() {
        let (mut p, _rx) = processor(vec![Block::paragraph("a", "one")]);
        let mut pinned = None;
        for intent in [Intent::Start, Intent::Keep] {
            let t = p.dispatch(intent).unwrap();
            pinned = pinned_heading(std::slice::from_ref(&t), pinned);
        }
        assert_eq!(pinned, None);

        let t = p.dispatch(Intent::Collect).unwrap();
        pinned = pinned_heading(std::slice::from_ref(&t), pinned);
        let heading = t.collected.map(|c| c.heading);
        assert!(heading.is_some());
        assert_eq!(pinned, heading);

        let roots = p.tree().blocks();
        let line = pinned.as_ref().and_then(|id| render::line_of(roots, id));
        assert_eq!(line, Some(4));

        let ignored = p.dispatch(Intent::Keep).unwrap();
        assert_eq!(pinned_heading(std::slice::from_ref(&ignored), pinned.clone()), pinned);
        let started = p.dispatch(Intent::Start).unwrap();
        assert_eq!(pinned_heading(&[started], pinned), None);
    }

    #[test]
    fn test_script_on_empty_document() {
        let (mut p, mut rx) = processor(vec![]);
        let report = run_script(&mut p, &mut rx, &[Intent::Start], "yellow").unwrap();
        assert!(report.starts_with("start: idle -> idle\n! Nothing to process\n"));
    }
}
