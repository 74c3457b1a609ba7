//! Suggestion list state: open/closed, current suggestions, and the highlight cursor.

use crate::types::{Key, ListItem, ListPosition, ListView, Rect, ScrollOffset, Suggestion};

pub const ITEM_CLASS: &str = "netsi-address-item";
pub const FUZZY_CLASS: &str = "netsi-address-item--fuzzy";
pub const ACTIVE_CLASS: &str = "netsi-address-item--active";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListState {
    #[default]
    Closed,
    Open {
        suggestions: Vec<Suggestion>,
        highlighted: Option<usize>,
    },
}

/// What a key press did to the list.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    Moved(usize),
    Select(Suggestion),
    Closed,
}

#[derive(Debug, Default)]
pub struct SuggestionList {
    state: ListState,
}

impl SuggestionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ListState::Open { .. })
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        match &self.state {
            ListState::Open { suggestions, .. } => suggestions,
            ListState::Closed => &[],
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        match self.state {
            ListState::Open { highlighted, .. } => highlighted,
            ListState::Closed => None,
        }
    }

    /// Replace the shown suggestions. An empty set closes the list.
    /// Returns whether the list is open afterwards.
    pub fn show(&mut self, suggestions: Vec<Suggestion>) -> bool {
        if suggestions.is_empty() {
            self.state = ListState::Closed;
            return false;
        }
        self.state = ListState::Open {
            suggestions,
            highlighted: None,
        };
        true
    }

    /// Returns whether the list was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = ListState::Closed;
        was_open
    }

    pub fn move_down(&mut self) -> Option<usize> {
        self.step(1)
    }

    pub fn move_up(&mut self) -> Option<usize> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Option<usize> {
        let ListState::Open {
            suggestions,
            highlighted,
        } = &mut self.state
        else {
            return None;
        };
        let len = suggestions.len() as isize;
        let next: isize = match *highlighted {
            None if delta > 0 => 0,
            None => len - 1,
            Some(i) => (i as isize + delta).rem_euclid(len),
        };
        let next = next as usize;
        *highlighted = Some(next);
        Some(next)
    }

    pub fn get(&self, index: usize) -> Option<&Suggestion> {
        self.suggestions().get(index)
    }

    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match key {
            Key::ArrowDown => self.move_down().map_or(KeyOutcome::Ignored, KeyOutcome::Moved),
            Key::ArrowUp => self.move_up().map_or(KeyOutcome::Ignored, KeyOutcome::Moved),
            Key::Enter => match self.highlighted().and_then(|i| self.get(i)) {
                Some(s) => KeyOutcome::Select(s.clone()),
                None => KeyOutcome::Ignored,
            },
            Key::Escape => {
                self.close();
                KeyOutcome::Closed
            }
            Key::Other => KeyOutcome::Ignored,
        }
    }

    pub fn view(&self, instance: &str, position: Option<ListPosition>) -> ListView {
        let highlighted = self.highlighted();
        let items = self
            .suggestions()
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let active = highlighted == Some(i);
                ListItem {
                    text: s.text.clone(),
                    fuzzy: s.fuzzy,
                    highlighted: active,
                    class: item_class(s.fuzzy, active),
                }
            })
            .collect();
        ListView {
            instance: instance.to_string(),
            open: self.is_open(),
            items,
            position: if self.is_open() { position } else { None },
        }
    }
}

fn item_class(fuzzy: bool, active: bool) -> String {
    let mut class = ITEM_CLASS.to_string();
    if fuzzy {
        class.push(' ');
        class.push_str(FUZZY_CLASS);
    }
    if active {
        class.push(' ');
        class.push_str(ACTIVE_CLASS);
    }
    class
}

/// Place the list directly below the input in page coordinates, matching its width.
pub fn place_below(input: Rect, scroll: ScrollOffset) -> ListPosition {
    ListPosition {
        left: input.left + scroll.x,
        top: input.top + input.height + scroll.y,
        width: input.width,
    }
}
