//! Keyboard event scripts for headless runs.
//!
//! One event per line: `<frame> <key> <down|up>`. Keys are `a`, `d`, `w`, `s`
//! or `space`. `#` starts a comment; blank lines are skipped. Events of the
//! same frame are delivered in file order.

use std::path::Path;

use anyhow::{Context, Result, bail};
use sim::{KeyEvent, KeyState, PushKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptedEvent {
    pub frame: u64,
    pub event: KeyEvent,
}

#[derive(Clone, Debug, Default)]
pub struct EventScript {
    events: Vec<ScriptedEvent>,
    cursor: usize,
}

impl EventScript {
    pub fn parse(text: &str) -> Result<Self> {
        let mut events = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let event = parse_line(line).with_context(|| format!("line {}: `{}`", index + 1, raw))?;
            events.push(event);
        }
        // Stable: same-frame events keep their file order.
        events.sort_by_key(|e| e.frame);
        Ok(Self { events, cursor: 0 })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading event script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing event script {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events scheduled at or before `frame` that were not delivered yet.
    pub fn due(&mut self, frame: u64) -> &[ScriptedEvent] {
        let start = self.cursor;
        while self
            .events
            .get(self.cursor)
            .is_some_and(|e| e.frame <= frame)
        {
            self.cursor += 1;
        }
        &self.events[start..self.cursor]
    }

    /// Last frame that carries an event.
    pub fn last_frame(&self) -> Option<u64> {
        self.events.last().map(|e| e.frame)
    }
}

fn parse_line(line: &str) -> Result<ScriptedEvent> {
    let mut fields = line.split_whitespace();
    let (Some(frame), Some(key), Some(state), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        bail!("expected `<frame> <key> <down|up>`");
    };

    let frame: u64 = frame
        .parse()
        .with_context(|| format!("invalid frame number `{frame}`"))?;
    let key: PushKey = key.parse()?;
    let state = match state.to_ascii_lowercase().as_str() {
        "down" => KeyState::Down,
        "up" => KeyState::Up,
        other => bail!("invalid key state `{other}` (expected down or up)"),
    };

    Ok(ScriptedEvent {
        frame,
        event: KeyEvent { key, state },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_events_and_skips_comments() {
        let script = EventScript::parse(
            "# push left for a while\n\
             0 a down\n\
             \n\
             30 a up   # stop\n\
             10 space down\n",
        )
        .unwrap();

        assert_eq!(script.len(), 3);
        assert_eq!(script.last_frame(), Some(30));
        assert_eq!(script.events[0].event, KeyEvent::down(PushKey::Left));
        assert_eq!(script.events[1].frame, 10);
        assert_eq!(script.events[1].event.key, PushKey::Space);
    }

    #[test]
    fn due_delivers_each_event_once_in_order() {
        let mut script = EventScript::parse("2 w down\n2 a down\n5 w up\n").unwrap();

        assert!(script.due(0).is_empty());
        let due: Vec<_> = script.due(3).iter().map(|e| e.event).collect();
        assert_eq!(
            due,
            vec![KeyEvent::down(PushKey::Forward), KeyEvent::down(PushKey::Left)]
        );
        assert!(script.due(3).is_empty());
        assert_eq!(script.due(100).len(), 1);
    }

    #[test]
    fn rejects_malformed_lines_with_line_numbers() {
        let err = EventScript::parse("0 a down\n1 q down\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));

        assert!(EventScript::parse("x a down").is_err());
        assert!(EventScript::parse("1 a sideways").is_err());
        assert!(EventScript::parse("1 a").is_err());
        assert!(EventScript::parse("1 a down extra").is_err());
    }

    #[test]
    fn demo_script_parses() {
        let script = EventScript::parse(include_str!("../../demos/push_into_puzzle.txt")).unwrap();
        assert_eq!(script.len(), 8);
        assert_eq!(script.last_frame(), Some(320));
    }

    #[test]
    fn empty_script_is_valid() {
        let script = EventScript::parse("# nothing\n\n").unwrap();
        assert!(script.is_empty());
        assert_eq!(script.last_frame(), None);
    }
}
