//! Snow texture classification with a run-scoped cache

use std::sync::{PoisonError, RwLock};

use ahash::AHashMap;

use crate::codec::{FormId, TextureFlags};

/// Resolved landscape texture definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTexture {
    pub form_id: FormId,
    /// `None` when the record carries no flags
    pub flags: Option<TextureFlags>,
}

/// Looks up texture definitions. `None` for dangling references.
pub trait TextureResolver: Sync {
    fn resolve_texture(&self, id: FormId) -> Option<ResolvedTexture>;
}

/// Memoized "is this texture snow" lookups, shared by every tile of one run.
///
/// Each texture is resolved at most once per classifier.
pub struct SnowClassifier<'r> {
    resolver: &'r dyn TextureResolver,
    cache: RwLock<AHashMap<FormId, bool>>,
}

impl<'r> SnowClassifier<'r> {
    pub fn new(resolver: &'r dyn TextureResolver) -> Self {
        Self {
            resolver,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    /// Null references and unresolvable textures are not snow
    pub fn is_snow(&self, texture: Option<FormId>) -> bool {
        let Some(id) = texture.and_then(FormId::non_null) else {
            return false;
        };

        if let Some(&cached) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(&id) {
            return cached;
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another worker may have classified it while we waited for the write lock
        *cache.entry(id).or_insert_with(|| classify(self.resolver.resolve_texture(id)))
    }

    /// Number of distinct textures classified so far
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn classify(texture: Option<ResolvedTexture>) -> bool {
    texture
        .and_then(|t| t.flags)
        .map_or(false, |flags| flags == TextureFlags::IS_SNOW)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    /// Resolver over a fixed table that counts lookups
    #[derive(Default)]
    pub(crate) struct TableResolver {
        pub flags: HashMap<FormId, Option<u8>>,
        pub lookups: AtomicUsize,
    }

    impl TableResolver {
        pub(crate) fn with(entries: &[(u32, Option<u8>)]) -> Self {
            Self {
                flags: entries.iter().map(|&(id, f)| (FormId(id), f)).collect(),
                lookups: AtomicUsize::new(0),
            }
        }

        pub(crate) fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl TextureResolver for TableResolver {
        fn resolve_texture(&self, id: FormId) -> Option<ResolvedTexture> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.flags.get(&id).map(|flags| ResolvedTexture {
                form_id: id,
                flags: flags.map(TextureFlags::from_bits_retain),
            })
        }
    }

    #[test]
    fn test_null_reference_is_not_snow() {
        let resolver = TableResolver::with(&[(0, Some(1))]);
        let classifier = SnowClassifier::new(&resolver);
        assert!(!classifier.is_snow(None));
        assert!(!classifier.is_snow(Some(FormId::NULL)));
        assert_eq!(resolver.lookups(), 0);
    }

    #[test]
    fn test_flag_must_match_exactly() {
        let resolver = TableResolver::with(&[
            (1, Some(0x01)),
            (2, Some(0x03)),
            (3, Some(0x00)),
            (4, None),
        ]);
        let classifier = SnowClassifier::new(&resolver);
        assert!(classifier.is_snow(Some(FormId(1))));
        assert!(!classifier.is_snow(Some(FormId(2))));
        assert!(!classifier.is_snow(Some(FormId(3))));
        assert!(!classifier.is_snow(Some(FormId(4))));
    }

    #[test]
    fn test_dangling_reference_is_not_snow() {
        let resolver = TableResolver::with(&[]);
        let classifier = SnowClassifier::new(&resolver);
        assert!(!classifier.is_snow(Some(FormId(0xDEAD))));
        assert!(!classifier.is_snow(Some(FormId(0xDEAD))));
        assert_eq!(resolver.lookups(), 1);
    }

    #[test]
    fn test_resolves_each_texture_once() {
        let resolver = TableResolver::with(&[(1, Some(1)), (2, Some(0))]);
        let classifier = SnowClassifier::new(&resolver);
        for _ in 0..10 {
            assert!(classifier.is_snow(Some(FormId(1))));
            assert!(!classifier.is_snow(Some(FormId(2))));
        }
        assert_eq!(resolver.lookups(), 2);
        assert_eq!(classifier.len(), 2);
    }

    #[test]
    fn test_racing_first_lookups_agree() {
        let resolver = TableResolver::with(&[(7, Some(1)), (8, Some(2))]);
        let classifier = SnowClassifier::new(&resolver);
        let barrier = Arc::new(Barrier::new(8));

        let results: Vec<(bool, bool)> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    let classifier = &classifier;
                    s.spawn(move || {
                        barrier.wait();
                        (classifier.is_snow(Some(FormId(7))), classifier.is_snow(Some(FormId(8))))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(|&r| r == (true, false)));
        assert_eq!(resolver.lookups(), 2);
    }
}
