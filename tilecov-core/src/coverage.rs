//! Classification of game objects against the tiles of a tileset.
//!
//! Every object of a file is either drawn by a tile of its own
//! ([`CoverageType::Unique`]), borrows another object's look through its
//! `looks_like` chain ([`CoverageType::Inherited`]), or has no sprite at all
//! ([`CoverageType::NoCoverage`]).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::error::{Result, TilecovError};
use crate::filter::{Filter, is_excluded};
use crate::record::GameObject;
use crate::tileset::Tileset;

/// How a single object is covered by a tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    /// A tile exists for the object's own id.
    Unique,
    /// The object resolves to another object through `looks_like`.
    Inherited,
    /// Neither of the above.
    NoCoverage,
}

/// Per-file tally of coverage types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageStats {
    /// Number of classified ids.
    pub total: usize,
    /// Ids with their own tile.
    pub unique: usize,
    /// Ids covered through `looks_like`.
    pub inherited: usize,
    /// Ids without any sprite.
    pub no_coverage: usize,
}

impl CoverageStats {
    fn tally(entries: &BTreeMap<String, CoverageType>) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Self::default()
        };
        for coverage in entries.values() {
            match coverage {
                CoverageType::Unique => stats.unique += 1,
                CoverageType::Inherited => stats.inherited += 1,
                CoverageType::NoCoverage => stats.no_coverage += 1,
            }
        }
        stats
    }

    /// Share of ids with a sprite, unique or inherited, in percent.
    pub fn covered_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.unique + self.inherited) as f64 / self.total as f64 * 100.0
    }
}

/// Classification of one data file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileCoverage {
    /// Coverage of each primary id in the file.
    pub entries: BTreeMap<String, CoverageType>,
    /// Totals over `entries`.
    pub stats: CoverageStats,
}

/// Lookup of objects by primary id; the first object in file order wins.
#[derive(Debug, Default)]
pub struct LooksLikeIndex<'a> {
    by_id: HashMap<&'a str, &'a GameObject>,
}

impl<'a> LooksLikeIndex<'a> {
    /// Index every object of a file, filtered or not.
    pub fn new(objects: &'a [GameObject]) -> Self {
        let mut by_id = HashMap::with_capacity(objects.len());
        for object in objects {
            if let Some(id) = object.primary_id() {
                by_id.entry(id).or_insert(object);
            }
        }
        Self { by_id }
    }

    /// Object whose primary id is `id`.
    pub fn get(&self, id: &str) -> Option<&'a GameObject> {
        self.by_id.get(id).copied()
    }
}

/// Follow the `looks_like` chain of `object` as far as it leads.
///
/// Returns `object` itself when it has no `looks_like` or the target is not in
/// the index. A chain that revisits a record is a
/// [`TilecovError::CoverageResolution`]; records of different types may share
/// an id without forming a cycle.
pub fn resolve_looks_like<'a>(
    object: &'a GameObject,
    index: &LooksLikeIndex<'a>,
) -> Result<&'a GameObject> {
    let start = object.primary_id().unwrap_or_default();
    let mut chain = vec![start.to_string()];
    let mut visited: Vec<&GameObject> = vec![object];
    let mut current = object;

    while let Some(target) = current.looks_like() {
        let Some(next) = index.get(target) else {
            break;
        };
        chain.push(next.primary_id().unwrap_or_default().to_string());
        if visited.iter().any(|seen| std::ptr::eq(*seen, next)) {
            return Err(TilecovError::CoverageResolution {
                id: start.to_string(),
                chain,
            });
        }
        visited.push(next);
        current = next;
    }
    Ok(current)
}

/// Classify every non-excluded object of one file.
pub fn classify_file(
    objects: &[GameObject],
    tile_ids: &HashSet<String>,
    filters: &[Filter],
) -> FileCoverage {
    let index = LooksLikeIndex::new(objects);
    let mut entries = BTreeMap::new();

    for object in objects {
        if is_excluded(filters, object) {
            continue;
        }
        let Some(id) = object.primary_id() else {
            continue;
        };
        let coverage = if tile_ids.contains(id) {
            CoverageType::Unique
        } else {
            match resolve_looks_like(object, &index) {
                Ok(resolved) if resolved != object => CoverageType::Inherited,
                Ok(_) => CoverageType::NoCoverage,
                Err(err) => {
                    warn!("{err}");
                    CoverageType::NoCoverage
                }
            }
        };
        entries.insert(id.to_string(), coverage);
    }

    let stats = CoverageStats::tally(&entries);
    FileCoverage { entries, stats }
}

/// Coverage of a set of data files by one tileset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TilesetCoverage {
    name: String,
    display_name: String,
    files: BTreeMap<PathBuf, FileCoverage>,
}

impl TilesetCoverage {
    /// Start collecting data files to classify against `tileset`.
    pub fn builder(tileset: &Tileset) -> TilesetCoverageBuilder<'_> {
        TilesetCoverageBuilder {
            tileset,
            filters: vec![Filter::NoEmptyId],
            files: BTreeMap::new(),
        }
    }

    /// Tileset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tileset display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Ids classified for `path`; empty when the path is unknown.
    pub fn coverage(&self, path: &Path) -> BTreeSet<&str> {
        self.files
            .get(path)
            .map(|file| file.entries.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Ids of `path` with the given coverage type.
    pub fn coverage_of_type(&self, coverage: CoverageType, path: &Path) -> BTreeSet<&str> {
        self.files
            .get(path)
            .map(|file| {
                file.entries
                    .iter()
                    .filter(|(_, value)| **value == coverage)
                    .map(|(id, _)| id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Totals for `path`.
    pub fn stats(&self, path: &Path) -> Option<CoverageStats> {
        self.files.get(path).map(|file| file.stats)
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &FileCoverage)> {
        self.files.iter().map(|(path, file)| (path.as_path(), file))
    }
}

/// Builder for [`TilesetCoverage`]; objects without ids are always excluded.
#[derive(Debug)]
pub struct TilesetCoverageBuilder<'a> {
    tileset: &'a Tileset,
    filters: Vec<Filter>,
    files: BTreeMap<PathBuf, &'a [GameObject]>,
}

impl<'a> TilesetCoverageBuilder<'a> {
    /// Add the objects decoded from `path`; a repeated path replaces the earlier set.
    pub fn with_objects(mut self, path: impl Into<PathBuf>, objects: &'a [GameObject]) -> Self {
        self.files.insert(path.into(), objects);
        self
    }

    /// Leave overlay objects out of the classification.
    pub fn exclude_overlays(mut self) -> Self {
        if !self.filters.contains(&Filter::NoOverlays) {
            self.filters.push(Filter::NoOverlays);
        }
        self
    }

    /// Classify every added file.
    pub fn build(self) -> TilesetCoverage {
        let tile_ids = self.tileset.tile_ids(&[]);
        debug!(
            "classifying {} files against {} tile ids of {}",
            self.files.len(),
            tile_ids.len(),
            self.tileset.name()
        );
        let files = self
            .files
            .into_iter()
            .map(|(path, objects)| {
                let coverage = classify_file(objects, &tile_ids, &self.filters);
                (path, coverage)
            })
            .collect();

        TilesetCoverage {
            name: self.tileset.name().to_string(),
            display_name: self.tileset.display_name().to_string(),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn gun(id: &str) -> GameObject {
        GameObject::new("GUN", [id])
    }

    fn tile_ids(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn guns() -> Vec<GameObject> {
        vec![
            gun("calico"),
            gun("ar15"),
            gun("cx4"),
            gun("90two").with_looks_like("cx4"),
            gun("glock_19").with_looks_like("90two"),
            gun("sniper_rifle"),
        ]
    }

    fn ids_of(file: &FileCoverage, coverage: CoverageType) -> Vec<&str> {
        file.entries
            .iter()
            .filter(|(_, value)| **value == coverage)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    #[test]
    fn classifies_the_gun_scenario() {
        let objects = guns();
        let file = classify_file(
            &objects,
            &tile_ids(&["calico", "ar15", "cx4"]),
            &[Filter::NoEmptyId],
        );

        assert_eq!(ids_of(&file, CoverageType::Unique), ["ar15", "calico", "cx4"]);
        assert_eq!(ids_of(&file, CoverageType::Inherited), ["90two", "glock_19"]);
        assert_eq!(ids_of(&file, CoverageType::NoCoverage), ["sniper_rifle"]);
        assert_eq!(
            file.stats,
            CoverageStats {
                total: 6,
                unique: 3,
                inherited: 2,
                no_coverage: 1,
            }
        );
    }

    #[test]
    fn looks_like_is_transitive() {
        let objects = vec![
            gun("one").with_looks_like("three"),
            gun("two").with_looks_like("one"),
            gun("three"),
        ];
        let index = LooksLikeIndex::new(&objects);
        let resolved = resolve_looks_like(&objects[1], &index).expect("resolve");
        assert_eq!(resolved.primary_id(), Some("three"));
    }

    #[test]
    fn dangling_looks_like_resolves_to_itself() {
        let objects = vec![gun("orphan").with_looks_like("nowhere")];
        let index = LooksLikeIndex::new(&objects);
        let resolved = resolve_looks_like(&objects[0], &index).expect("resolve");
        assert_eq!(resolved, &objects[0]);

        let file = classify_file(&objects, &HashSet::new(), &[]);
        assert_eq!(file.entries["orphan"], CoverageType::NoCoverage);
    }

    #[test]
    fn cycles_are_reported_and_classified_as_no_coverage() {
        let objects = vec![
            gun("a").with_looks_like("b"),
            gun("b").with_looks_like("a"),
            gun("me").with_looks_like("me"),
        ];
        let index = LooksLikeIndex::new(&objects);
        match resolve_looks_like(&objects[0], &index) {
            Err(TilecovError::CoverageResolution { id, chain }) => {
                assert_eq!(id, "a");
                assert_eq!(chain, ["a", "b", "a"]);
            }
            other => panic!("expected CoverageResolution, got {other:?}"),
        }

        let file = classify_file(&objects, &HashSet::new(), &[Filter::NoEmptyId]);
        assert!(file
            .entries
            .values()
            .all(|coverage| *coverage == CoverageType::NoCoverage));
        assert_eq!(file.stats.total, 3);
    }

    #[test]
    fn shared_id_across_types_is_not_a_cycle() {
        let objects = vec![
            GameObject::new("AMMO", ["x"]),
            gun("x").with_looks_like("y"),
            gun("y").with_looks_like("x"),
        ];
        let index = LooksLikeIndex::new(&objects);
        let resolved = resolve_looks_like(&objects[1], &index).expect("resolve");
        assert_eq!(resolved.kind(), "AMMO");
        assert_eq!(resolved, &objects[0]);

        let file = classify_file(&objects, &HashSet::new(), &[Filter::NoEmptyId]);
        assert_eq!(file.entries["x"], CoverageType::Inherited);
        assert_eq!(file.entries["y"], CoverageType::Inherited);
    }

    #[test]
    fn lookup_uses_the_unfiltered_file_and_first_match() {
        let objects = vec![
            gun("_overlay_glock"),
            gun("glock").with_looks_like("_overlay_glock"),
            GameObject::new("AMMO", ["_overlay_glock"]).with_looks_like("glock"),
        ];
        let file = classify_file(
            &objects,
            &HashSet::new(),
            &[Filter::NoEmptyId, Filter::NoOverlays],
        );
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries["glock"], CoverageType::Inherited);
    }

    #[test]
    fn objects_without_ids_are_skipped() {
        let objects = vec![GameObject::new("GUN", Vec::<String>::new()), gun("")];
        let file = classify_file(&objects, &HashSet::new(), &[Filter::NoEmptyId]);
        assert!(file.entries.is_empty());
        assert_eq!(file.stats, CoverageStats::default());
        assert_eq!(file.stats.covered_percent(), 0.0);
    }

    fn tileset() -> Tileset {
        let mut fs = MockFileSystem::new();
        fs.expect_is_dir().returning(|_| true);
        fs.expect_is_file().returning(|_| true);
        fs.expect_read_to_string().returning(|path| {
            if path.ends_with("tileset.txt") {
                Ok("NAME=ultica\nVIEW=Ultica\nJSON=tile_config.json\n".to_string())
            } else {
                Ok(r#"{ "tiles-new": [{ "tiles": [
                    { "id": ["calico", "ar15"] },
                    { "id": "cx4" },
                    { "id": "_overlay_wielded_ar15" }
                ] }] }"#
                    .to_string())
            }
        });
        Tileset::load(&fs, Path::new("/gfx/ultica")).expect("load tileset")
    }

    #[test]
    fn builder_classifies_every_file_and_answers_queries() {
        let tileset = tileset();
        let objects = guns();
        let overlays = vec![gun("_overlay_wielded_ar15"), gun("")];

        let coverage = TilesetCoverage::builder(&tileset)
            .with_objects("items/guns.json", &objects)
            .with_objects("items/overlays.json", &overlays)
            .build();

        assert_eq!(coverage.name(), "ultica");
        assert_eq!(coverage.display_name(), "Ultica");

        let guns_path = Path::new("items/guns.json");
        assert_eq!(coverage.coverage(guns_path).len(), 6);
        assert_eq!(
            coverage.coverage_of_type(CoverageType::Inherited, guns_path),
            BTreeSet::from(["90two", "glock_19"])
        );
        assert_eq!(coverage.stats(guns_path).map(|stats| stats.unique), Some(3));
        assert!(coverage.coverage(Path::new("missing.json")).is_empty());
        assert_eq!(coverage.stats(Path::new("missing.json")), None);

        let overlay_path = Path::new("items/overlays.json");
        assert_eq!(
            coverage.coverage_of_type(CoverageType::Unique, overlay_path),
            BTreeSet::from(["_overlay_wielded_ar15"])
        );

        let paths: Vec<_> = coverage.files().map(|(path, _)| path).collect();
        assert_eq!(paths, [guns_path, overlay_path]);
    }

    #[test]
    fn excluding_overlays_drops_them_from_the_totals() {
        let tileset = tileset();
        let overlays = vec![gun("_overlay_wielded_ar15"), gun("calico")];

        let coverage = TilesetCoverage::builder(&tileset)
            .with_objects("items/overlays.json", &overlays)
            .exclude_overlays()
            .build();
        let stats = coverage
            .stats(Path::new("items/overlays.json"))
            .expect("stats");
        assert_eq!(stats.total, 1);
        assert_eq!(stats.unique, 1);
    }

    #[test]
    fn classification_is_idempotent() {
        let tileset = tileset();
        let objects = guns();
        let first = TilesetCoverage::builder(&tileset)
            .with_objects("items/guns.json", &objects)
            .build();
        let second = TilesetCoverage::builder(&tileset)
            .with_objects("items/guns.json", &objects)
            .build();
        assert_eq!(first, second);

        for (_, file) in first.files() {
            let stats = file.stats;
            assert_eq!(stats.total, stats.unique + stats.inherited + stats.no_coverage);
        }
    }
}
