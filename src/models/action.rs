use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Ignored,
    Saved,
    Applied,
    Blocked,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Ignored => "ignored",
            ActionKind::Saved => "saved",
            ActionKind::Applied => "applied",
            ActionKind::Blocked => "blocked",
        }
    }

    // saved listings stay visible in the queue; the other three exclude.
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, ActionKind::Saved)
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignored" => Ok(ActionKind::Ignored),
            "saved" => Ok(ActionKind::Saved),
            "applied" => Ok(ActionKind::Applied),
            "blocked" => Ok(ActionKind::Blocked),
            other => Err(format!("unknown action kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingAction {
    pub listing_id: Uuid,
    pub action: ActionKind,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionLogDoc {
    pub history: Vec<ListingAction>,
    pub ignored: Vec<Uuid>,
    pub saved: Vec<Uuid>,
    pub applied: Vec<Uuid>,
    pub blocked: Vec<Uuid>,
}

impl ActionLogDoc {
    pub fn members(&self, kind: ActionKind) -> &[Uuid] {
        match kind {
            ActionKind::Ignored => &self.ignored,
            ActionKind::Saved => &self.saved,
            ActionKind::Applied => &self.applied,
            ActionKind::Blocked => &self.blocked,
        }
    }

    fn members_mut(&mut self, kind: ActionKind) -> &mut Vec<Uuid> {
        match kind {
            ActionKind::Ignored => &mut self.ignored,
            ActionKind::Saved => &mut self.saved,
            ActionKind::Applied => &mut self.applied,
            ActionKind::Blocked => &mut self.blocked,
        }
    }

    pub fn contains(&self, kind: ActionKind, listing_id: Uuid) -> bool {
        self.members(kind).contains(&listing_id)
    }

    // The log itself always grows; only the membership add is idempotent.
    // A listing may sit in at most one of {ignored, applied, blocked}.
    pub fn append(&mut self, action: ListingAction) {
        if action.action.is_exclusive() {
            for other in [ActionKind::Ignored, ActionKind::Applied, ActionKind::Blocked] {
                if other != action.action {
                    self.members_mut(other).retain(|id| *id != action.listing_id);
                }
            }
        }
        let list = self.members_mut(action.action);
        if !list.contains(&action.listing_id) {
            list.push(action.listing_id);
        }
        self.history.push(action);
    }

    pub fn remove(&mut self, kind: ActionKind, listing_id: Uuid) {
        self.members_mut(kind).retain(|id| *id != listing_id);
        self.history
            .retain(|entry| !(entry.listing_id == listing_id && entry.action == kind));
    }

    pub fn excluded_ids(&self) -> HashSet<Uuid> {
        self.ignored
            .iter()
            .chain(self.applied.iter())
            .chain(self.blocked.iter())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(listing_id: Uuid, kind: ActionKind) -> ListingAction {
        ListingAction {
            listing_id,
            action: kind,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn append_is_idempotent_for_membership() {
        let mut doc = ActionLogDoc::default();
        let id = Uuid::new_v4();
        doc.append(action(id, ActionKind::Saved));
        doc.append(action(id, ActionKind::Saved));
        assert_eq!(doc.saved, vec![id]);
        assert_eq!(doc.history.len(), 2);
    }

    #[test]
    fn exclusive_kinds_evict_each_other() {
        let mut doc = ActionLogDoc::default();
        let id = Uuid::new_v4();
        doc.append(action(id, ActionKind::Ignored));
        doc.append(action(id, ActionKind::Blocked));
        assert!(doc.ignored.is_empty());
        assert_eq!(doc.blocked, vec![id]);

        doc.append(action(id, ActionKind::Applied));
        assert!(doc.blocked.is_empty());
        assert_eq!(doc.applied, vec![id]);
    }

    #[test]
    fn saved_overlaps_exclusive_sets() {
        let mut doc = ActionLogDoc::default();
        let id = Uuid::new_v4();
        doc.append(action(id, ActionKind::Saved));
        doc.append(action(id, ActionKind::Blocked));
        assert_eq!(doc.saved, vec![id]);
        assert_eq!(doc.blocked, vec![id]);
    }

    #[test]
    fn remove_purges_membership_and_matching_history() {
        let mut doc = ActionLogDoc::default();
        let id = Uuid::new_v4();
        doc.append(action(id, ActionKind::Saved));
        doc.append(action(id, ActionKind::Ignored));
        doc.remove(ActionKind::Saved, id);
        assert!(doc.saved.is_empty());
        assert_eq!(doc.ignored, vec![id]);
        assert_eq!(doc.history.len(), 1);
        assert_eq!(doc.history[0].action, ActionKind::Ignored);
    }
}
