use artifex_types::ImageId;

/// Snapshot of the images currently held by a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Valid image identifiers, sorted.
    pub images: Vec<ImageId>,
    /// Entries present in the store that were not recognised as images.
    pub skipped: usize,
}

impl Catalog {
    /// Filter raw store entries down to recognised image identifiers.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut images = Vec::new();
        let mut skipped = 0;
        for entry in entries {
            match ImageId::parse(entry) {
                Ok(id) if id.has_image_extension() => images.push(id),
                Ok(id) => {
                    tracing::debug!(%id, "skipping entry without image extension");
                    skipped += 1;
                }
                Err(e) => {
                    tracing::warn!("skipping unaddressable store entry: {e}");
                    skipped += 1;
                }
            }
        }
        images.sort();
        Self { images, skipped }
    }

    /// Total entries seen, recognised or not.
    pub fn total_entries(&self) -> usize {
        self.images.len() + self.skipped
    }

    /// Whether no valid image was found.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(catalog: &Catalog) -> Vec<&str> {
        catalog.images.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn filters_by_extension_case_insensitively() {
        let catalog = Catalog::from_entries(["a.jpg", "b.txt", "c.PNG"]);
        assert_eq!(names(&catalog), vec!["a.jpg", "c.PNG"]);
        assert_eq!(catalog.skipped, 1);
        assert_eq!(catalog.total_entries(), 3);
    }

    #[test]
    fn result_is_sorted() {
        let catalog = Catalog::from_entries(["z.gif", "m.webp", "a.bmp"]);
        assert_eq!(names(&catalog), vec!["a.bmp", "m.webp", "z.gif"]);
    }

    #[test]
    fn unaddressable_names_are_skipped() {
        let catalog = Catalog::from_entries(["with space.png", "ok.jpeg"]);
        assert_eq!(names(&catalog), vec!["ok.jpeg"]);
        assert_eq!(catalog.skipped, 1);
    }

    #[test]
    fn empty_input() {
        let catalog = Catalog::from_entries(Vec::<String>::new());
        assert!(catalog.is_empty());
        assert_eq!(catalog.total_entries(), 0);
    }

    #[test]
    fn only_non_images() {
        let catalog = Catalog::from_entries(["notes.txt", "README"]);
        assert!(catalog.is_empty());
        assert_eq!(catalog.total_entries(), 2);
    }
}
