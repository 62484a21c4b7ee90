//! Per-user collage session holding the ordered layer list
//!
//! List order doubles as paint order: the first item is painted first and
//! every later item is painted on top of it.

use crate::{
    error::{CollageError, Result},
    item::{CollageItem, Placement},
};
use tracing::{debug, info};
use uuid::Uuid;

/// One user's in-memory collage
#[derive(Debug, Clone)]
pub struct CollageSession {
    id: Uuid,
    user_name: String,
    items: Vec<CollageItem>,
}

impl CollageSession {
    /// Start a session for `user_name`
    ///
    /// # Errors
    /// - `InvalidInput` when the name is empty or whitespace only
    pub fn new<S: AsRef<str>>(user_name: S) -> Result<Self> {
        let user_name = user_name.as_ref().trim();
        if user_name.is_empty() {
            return Err(CollageError::invalid_input(
                "a name is required before starting a collage",
            ));
        }

        let session = Self {
            id: Uuid::new_v4(),
            user_name: user_name.to_string(),
            items: Vec::new(),
        };
        info!(session_id = %session.id, user = %session.user_name, "🎨 Collage session started");
        Ok(session)
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Title shown above the collage
    #[must_use]
    pub fn title(&self) -> String {
        format!("💖 {}'s Favorite Things 💖", self.user_name)
    }

    #[must_use]
    pub fn items(&self) -> &[CollageItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append an item on top of the stack and return its index
    pub fn add(&mut self, item: CollageItem) -> usize {
        debug!(name = %item.name, kind = %item.kind, "Adding layer");
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn get(&self, index: usize) -> Result<&CollageItem> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or(CollageError::IndexOutOfRange { index, len })
    }

    /// Move an item one layer down the paint order (towards index 0)
    ///
    /// Returns `false` without changes when the item is already first.
    pub fn move_up(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(false);
        }
        self.items.swap(index, index - 1);
        debug!(from = index, to = index - 1, "Moved layer up");
        Ok(true)
    }

    /// Move an item one layer up the paint order (towards the end)
    ///
    /// Returns `false` without changes when the item is already last.
    pub fn move_down(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        if index + 1 >= self.items.len() {
            return Ok(false);
        }
        self.items.swap(index, index + 1);
        debug!(from = index, to = index + 1, "Moved layer down");
        Ok(true)
    }

    pub fn remove(&mut self, index: usize) -> Result<CollageItem> {
        self.check_index(index)?;
        let item = self.items.remove(index);
        debug!(name = %item.name, index, "Removed layer");
        Ok(item)
    }

    /// Pin an item to an explicit placement, or clear it with `None`
    ///
    /// # Errors
    /// - `IndexOutOfRange` for an unknown layer
    /// - `InvalidInput` when the placement fails [`Placement::validate`]
    pub fn set_placement(&mut self, index: usize, placement: Option<Placement>) -> Result<()> {
        if let Some(placement) = &placement {
            placement.validate()?;
        }
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(CollageError::IndexOutOfRange { index, len })?;
        item.placement = placement;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Numbered layer labels, bottom layer first
    #[must_use]
    pub fn layer_labels(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("[layer {}] {} ({})", i + 1, item.name, item.kind))
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(CollageError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use image::RgbaImage;

    fn item(name: &str) -> CollageItem {
        CollageItem::new(name, ItemKind::Photo, RgbaImage::new(4, 4))
    }

    fn names(session: &CollageSession) -> Vec<&str> {
        session.items().iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            CollageSession::new("   "),
            Err(CollageError::InvalidInput(_))
        ));
        assert_eq!(CollageSession::new("  Mina ").unwrap().user_name(), "Mina");
    }

    #[test]
    fn test_move_up_twice_restores_order() {
        let mut session = CollageSession::new("Mina").unwrap();
        session.add(item("a"));
        session.add(item("b"));

        assert!(session.move_up(1).unwrap());
        assert_eq!(names(&session), ["b", "a"]);
        assert!(session.move_up(1).unwrap());
        assert_eq!(names(&session), ["a", "b"]);
    }

    #[test]
    fn test_move_down_twice_restores_order() {
        let mut session = CollageSession::new("Mina").unwrap();
        session.add(item("a"));
        session.add(item("b"));

        assert!(session.move_down(0).unwrap());
        assert!(session.move_down(0).unwrap());
        assert_eq!(names(&session), ["a", "b"]);
    }

    #[test]
    fn test_boundary_moves_are_noops() {
        let mut session = CollageSession::new("Mina").unwrap();
        session.add(item("a"));
        session.add(item("b"));

        assert!(!session.move_up(0).unwrap());
        assert!(!session.move_down(1).unwrap());
        assert_eq!(names(&session), ["a", "b"]);
    }

    #[test]
    fn test_remove_shrinks_by_one() {
        let mut session = CollageSession::new("Mina").unwrap();
        for name in ["a", "b", "c"] {
            session.add(item(name));
        }

        let removed = session.remove(1).unwrap();
        assert_eq!(removed.name, "b");
        assert_eq!(session.len(), 2);
        assert_eq!(names(&session), ["a", "c"]);
    }

    #[test]
    fn test_out_of_range_indices() {
        let mut session = CollageSession::new("Mina").unwrap();
        session.add(item("a"));

        assert!(matches!(
            session.remove(3),
            Err(CollageError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(session.move_up(1).is_err());
        assert!(session.move_down(1).is_err());
        assert!(session.set_placement(2, None).is_err());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_duplicate_names_allowed_and_labelled() {
        let mut session = CollageSession::new("Mina").unwrap();
        session.add(item("cat"));
        session.add(item("cat"));

        assert_eq!(
            session.layer_labels(),
            ["[layer 1] cat (photo)", "[layer 2] cat (photo)"]
        );
    }

    #[test]
    fn test_set_placement() {
        let mut session = CollageSession::new("Mina").unwrap();
        session.add(item("a"));
        session
            .set_placement(0, Some(Placement::new(5, 6, 100)))
            .unwrap();
        assert_eq!(
            session.get(0).unwrap().placement,
            Some(Placement::new(5, 6, 100))
        );
    }

    #[test]
    fn test_set_placement_rejects_oversized_width() {
        let mut session = CollageSession::new("Mina").unwrap();
        session.add(item("a"));
        let result = session.set_placement(0, Some(Placement::new(0, 0, 100_000)));
        assert!(matches!(result, Err(CollageError::InvalidInput(_))));
        assert_eq!(session.get(0).unwrap().placement, None);
    }
}
