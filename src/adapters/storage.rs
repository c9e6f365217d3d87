use crate::core::{CartSnapshot, CartStorage, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Keeps the cart snapshot as a JSON file; a missing file is an empty cart.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Option<CartSnapshot>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the slot and rename over it so a crash never leaves half a cart.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_vec(snapshot)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Cart, CartItem, Product};
    use crate::utils::error::StoreError;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_cart() {
        let dir = TempDir::new().unwrap();
        let storage = FileCartStorage::new(dir.path().join("cart.json"));
        assert!(storage.load().unwrap().is_none());
        assert!(storage.clear().is_ok());
    }

    #[test]
    fn test_save_creates_parent_and_uses_wire_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cart.json");
        let storage = FileCartStorage::new(&path);
        let cart = Cart::from_items(vec![CartItem::new(
            Product::new("a", "Item A", Decimal::from(10), true),
            2,
        )])
        .unwrap();

        storage.save(&cart.snapshot()).unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["totalQuantity"], 2);
        assert_eq!(raw["subTotal"].as_f64(), Some(20.0));
        assert_eq!(raw["items"][0]["item_id"], "a");
        assert_eq!(raw["items"][0]["cartQuantity"], 2);
        assert_eq!(storage.load().unwrap(), Some(cart.snapshot()));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, b"{not json").unwrap();

        let err = FileCartStorage::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::SerializationError(_)));
    }
}
