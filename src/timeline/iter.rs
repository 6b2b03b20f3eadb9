//! walking a page of timeline instructions

use serde_json::Value;
use tracing::debug;

use super::entries::{classify, unpack_cursor, unpack_tweet, EntryKind};
use crate::error::{Error, Result};
use crate::types::{CursorState, Entry};

/// an entry waiting to be unpacked and whether it came from a replace
/// instruction (those only ever update cursors)
type Pending<'a> = (&'a Value, bool);

/// entries of every add / replace instruction, in order, both generations
fn pending_entries(timeline: &Value) -> Vec<Pending<'_>> {
  let mut pending = Vec::new();
  let instructions = timeline
    .get("instructions")
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[]);

  for instruction in instructions {
    match instruction.get("type").and_then(Value::as_str) {
      Some("TimelineAddEntries") => {
        let entries = instruction.get("entries").and_then(Value::as_array);
        pending.extend(entries.into_iter().flatten().map(|e| (e, false)));
      }
      Some("TimelineReplaceEntry") => {
        pending.extend(instruction.get("entry").map(|e| (e, true)));
      }
      Some(other) => debug!(instruction = other, "skipping instruction"),
      None => {
        if let Some(entries) = instruction.pointer("/addEntries/entries").and_then(Value::as_array) {
          pending.extend(entries.iter().map(|e| (e, false)));
        } else if let Some(entry) = instruction.pointer("/replaceEntry/entry") {
          pending.push((entry, true));
        }
      }
    }
  }
  pending
}

/// lazy sequence of the entries on one timeline page
///
/// nothing is normalized until the caller pulls the next item. cursor
/// entries are yielded and also recorded into the borrowed [`CursorState`].
pub struct TimelineEntries<'a> {
  pending: std::vec::IntoIter<Pending<'a>>,
  globals: Option<&'a Value>,
  remaining: i64,
  cursors: &'a mut CursorState,
}

/// iterate a timeline page.
///
/// `limit` < 0 is unbounded, 0 yields nothing, > 0 stops after that many
/// tweets (tombstones included). when a limit stops the page early the rest
/// of it is only searched for cursors.
pub fn iter_timeline<'a>(
  timeline: &'a Value,
  globals: Option<&'a Value>,
  limit: i64,
  cursors: &'a mut CursorState,
) -> TimelineEntries<'a> {
  let pending = if limit == 0 {
    Vec::new()
  } else {
    pending_entries(timeline)
  };
  TimelineEntries {
    pending: pending.into_iter(),
    globals,
    remaining: limit,
    cursors,
  }
}

impl<'a> TimelineEntries<'a> {
  /// what is left of the limit; negative when unbounded
  pub fn remaining(&self) -> i64 {
    self.remaining
  }

  pub fn cursors(&self) -> &CursorState {
    &*self.cursors
  }

  /// record the cursors still ahead without normalizing any tweet
  fn sweep_cursors(&mut self) {
    for (entry, _) in self.pending.by_ref() {
      let Some(entry_id) = entry.get("entryId").and_then(Value::as_str) else {
        continue;
      };
      if classify(entry_id) != EntryKind::Cursor {
        continue;
      }
      match unpack_cursor(entry, entry_id) {
        Ok(Some(cursor)) => self.cursors.record(cursor),
        Ok(None) => {}
        Err(e) => debug!(entry_id, error = %e, "unreadable cursor after the limit"),
      }
    }
  }

  fn count_item(&mut self) {
    if self.remaining > 0 {
      self.remaining -= 1;
      if self.remaining == 0 {
        self.sweep_cursors();
      }
    }
  }
}

impl<'a> Iterator for TimelineEntries<'a> {
  type Item = Result<Entry>;

  fn next(&mut self) -> Option<Result<Entry>> {
    loop {
      let (entry, replace) = self.pending.next()?;
      let Some(entry_id) = entry.get("entryId").and_then(Value::as_str) else {
        return Some(Err(Error::malformed("timeline entry", "missing `entryId`")));
      };

      match classify(entry_id) {
        EntryKind::Cursor => match unpack_cursor(entry, entry_id) {
          Ok(Some(cursor)) => {
            self.cursors.record(cursor.clone());
            return Some(Ok(Entry::Cursor(cursor)));
          }
          Ok(None) => continue,
          Err(e) => return Some(Err(e)),
        },
        EntryKind::Tweet if !replace => {
          let unpacked = unpack_tweet(entry, self.globals, entry_id);
          if unpacked.is_ok() {
            self.count_item();
          }
          return Some(unpacked);
        }
        EntryKind::Tweet | EntryKind::Other => continue,
      }
    }
  }
}
