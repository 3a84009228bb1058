//! Tileset metadata and tile config loading.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::config::parse_properties;
use crate::decode::{FieldTable, Record, RecordDecoder};
use crate::error::{Result, TilecovError};
use crate::filter::{Filter, Identifiable, is_excluded};
use crate::fs::FileSystem;
use crate::store::{Arity, RecordStore};

/// Metadata file every tileset directory carries.
pub const TILESET_METADATA: &str = "tileset.txt";

const UNKNOWN: &str = "Unknown";

/// Tile dimensions shared by a whole tileset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TileInfo {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    pixelscale: u32,
    #[serde(default)]
    iso: bool,
}

impl TileInfo {
    /// Tile width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Tile height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel scale; a missing or zero value means 1.
    pub fn pixel_scale(&self) -> u32 {
        self.pixelscale.max(1)
    }

    /// Whether the tileset is isometric.
    pub fn is_isometric(&self) -> bool {
        self.iso
    }
}

impl Record for TileInfo {
    const SHAPE: &'static str = "TileInfo";
}

/// One tile definition inside an atlas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TileEntry {
    #[serde(skip)]
    ids: Vec<String>,
    #[serde(skip)]
    foreground: Vec<String>,
    #[serde(skip)]
    background: Vec<String>,
}

impl TileEntry {
    /// Sprite indices drawn in the foreground.
    pub fn foreground(&self) -> &[String] {
        &self.foreground
    }

    /// Sprite indices drawn in the background.
    pub fn background(&self) -> &[String] {
        &self.background
    }
}

impl Identifiable for TileEntry {
    fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl Record for TileEntry {
    const SHAPE: &'static str = "TileEntry";

    fn field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .list_like("id", |tile, ids| tile.ids = ids)
            .list_like("fg", |tile, indices| tile.foreground = indices)
            .list_like("bg", |tile, indices| tile.background = indices)
    }
}

/// A sprite sheet and the tiles drawn from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TileAtlas {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    sprite_width: i32,
    #[serde(default)]
    sprite_height: i32,
    #[serde(default)]
    sprite_offset_x: i32,
    #[serde(default)]
    sprite_offset_y: i32,
    #[serde(skip)]
    tiles: Vec<TileEntry>,
}

impl TileAtlas {
    /// Sprite sheet file name; empty when unset.
    pub fn file(&self) -> &str {
        self.file.as_deref().unwrap_or_default()
    }

    /// Sprite size override as `(width, height)`; zero means the tile size.
    pub fn sprite_size(&self) -> (i32, i32) {
        (self.sprite_width, self.sprite_height)
    }

    /// Sprite offset as `(x, y)`.
    pub fn sprite_offset(&self) -> (i32, i32) {
        (self.sprite_offset_x, self.sprite_offset_y)
    }

    /// Tiles drawn from this sheet.
    pub fn tiles(&self) -> &[TileEntry] {
        &self.tiles
    }
}

impl Record for TileAtlas {
    const SHAPE: &'static str = "TileAtlas";

    fn field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .nested_list::<TileEntry>("tiles", |atlas, tiles| atlas.tiles = tiles)
    }
}

/// Decoded `tile_config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TileConfig {
    #[serde(skip)]
    tile_info: Option<TileInfo>,
    #[serde(skip)]
    atlases: Vec<TileAtlas>,
}

impl TileConfig {
    /// Tile dimensions, when the config declares them.
    pub fn tile_info(&self) -> Option<&TileInfo> {
        self.tile_info.as_ref()
    }

    /// Atlases listed under `tiles-new`.
    pub fn atlases(&self) -> &[TileAtlas] {
        &self.atlases
    }
}

impl Record for TileConfig {
    const SHAPE: &'static str = "TileConfig";

    fn field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .nested_list::<TileInfo>("tile_info", |config, infos| {
                config.tile_info = infos.into_iter().next();
            })
            .nested_list::<TileAtlas>("tiles-new", |config, atlases| config.atlases = atlases)
    }
}

/// A tileset directory: metadata plus its decoded tile config.
#[derive(Debug, Clone)]
pub struct Tileset {
    name: String,
    display_name: String,
    directory: PathBuf,
    config: TileConfig,
}

impl Tileset {
    /// Load the tileset stored in `directory`.
    pub fn load<F: FileSystem + ?Sized>(fs: &F, directory: &Path) -> Result<Self> {
        if !fs.is_dir(directory) {
            return Err(TilecovError::DirectoryNotFound(directory.to_path_buf()));
        }
        let metadata_path = directory.join(TILESET_METADATA);
        if !fs.is_file(&metadata_path) {
            return Err(TilecovError::MetadataNotFound(directory.to_path_buf()));
        }
        let metadata = parse_properties(&fs.read_to_string(&metadata_path)?);
        let name = metadata
            .get("NAME")
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string());
        let display_name = metadata
            .get("VIEW")
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string());

        let Some(config_name) = metadata.get("JSON") else {
            return Err(TilecovError::MissingConfigPath { tileset: name });
        };
        let config_path = directory.join(config_name);
        if !fs.is_file(&config_path) {
            return Err(TilecovError::ConfigFileNotFound {
                tileset: name,
                path: config_path,
            });
        }

        debug!("loading tileset {name} from {}", config_path.display());
        let config = RecordStore::<TileConfig>::create()
            .arity(Arity::Single)
            .with_decoder(RecordDecoder::declared()?)
            .execute_path(fs, &config_path)?
            .and_then(|decoded| decoded.into_single())
            .ok_or(TilecovError::NullConfigObject(config_path))?;

        Ok(Self {
            name,
            display_name,
            directory: directory.to_path_buf(),
            config,
        })
    }

    /// Internal name (`NAME`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable name (`VIEW`).
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Directory the tileset was loaded from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Decoded tile config.
    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    /// Ids of all tiles across every atlas that no filter excludes.
    pub fn tile_ids(&self, filters: &[Filter]) -> HashSet<String> {
        self.config
            .atlases
            .iter()
            .flat_map(|atlas| atlas.tiles.iter())
            .filter(|tile| !is_excluded(filters, *tile))
            .flat_map(|tile| tile.ids.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::fs::StdFileSystem;
    use crate::fs::tests::temp_root;
    use std::collections::HashMap;

    const TILE_CONFIG: &str = r#"{
        "tile_info": [{ "width": 32, "height": 32, "pixelscale": 0 }],
        "tiles-new": [
            {
                "file": "tiles.png",
                "tiles": [
                    { "id": "calico", "fg": 1 },
                    { "id": ["ar15", "cx4"], "fg": [2, 3], "bg": 4 },
                    { "id": "_overlay_wielded_calico", "fg": 5 },
                    { "id": "", "fg": 6 }
                ]
            },
            {
                "file": "large.png",
                "sprite_width": 64,
                "sprite_height": 64,
                "sprite_offset_x": -16,
                "tiles": [{ "id": "t_tree", "fg": 7 }]
            }
        ]
    }"#;

    fn mock_fs(files: &[(&str, &str)]) -> MockFileSystem {
        let files: HashMap<PathBuf, String> = files
            .iter()
            .map(|(path, contents)| (PathBuf::from(path), contents.to_string()))
            .collect();
        let present = files.clone();
        let mut fs = MockFileSystem::new();
        fs.expect_is_dir().returning(|path| path == Path::new("/gfx/ultica"));
        fs.expect_is_file()
            .returning(move |path| present.contains_key(path));
        fs.expect_read_to_string().returning(move |path| {
            files
                .get(path)
                .cloned()
                .ok_or_else(|| TilecovError::ResourceNotFound(path.to_path_buf()))
        });
        fs
    }

    #[test]
    fn loads_metadata_and_tile_config() {
        let fs = mock_fs(&[
            (
                "/gfx/ultica/tileset.txt",
                "# Ultica\nNAME: UltimateCataclysm\nVIEW: Ultica\nJSON: tile_config.json\n",
            ),
            ("/gfx/ultica/tile_config.json", TILE_CONFIG),
        ]);

        let tileset = Tileset::load(&fs, Path::new("/gfx/ultica")).expect("load tileset");
        assert_eq!(tileset.name(), "UltimateCataclysm");
        assert_eq!(tileset.display_name(), "Ultica");

        let info = tileset.config().tile_info().expect("tile info");
        assert_eq!((info.width(), info.height(), info.pixel_scale()), (32, 32, 1));
        assert!(!info.is_isometric());

        let atlases = tileset.config().atlases();
        assert_eq!(atlases.len(), 2);
        assert_eq!(atlases[0].file(), "tiles.png");
        assert_eq!(atlases[0].tiles()[1].foreground(), ["2", "3"]);
        assert_eq!(atlases[0].tiles()[1].background(), ["4"]);
        assert_eq!(atlases[1].sprite_size(), (64, 64));
        assert_eq!(atlases[1].sprite_offset(), (-16, 0));
    }

    #[test]
    fn tile_ids_apply_filters() {
        let fs = mock_fs(&[
            ("/gfx/ultica/tileset.txt", "JSON=tile_config.json\n"),
            ("/gfx/ultica/tile_config.json", TILE_CONFIG),
        ]);
        let tileset = Tileset::load(&fs, Path::new("/gfx/ultica")).expect("load tileset");
        assert_eq!(tileset.name(), "Unknown");
        assert_eq!(tileset.display_name(), "Unknown");

        let all = tileset.tile_ids(&[]);
        assert_eq!(all.len(), 6);

        let filtered = tileset.tile_ids(&[Filter::NoEmptyId, Filter::NoOverlays]);
        let expected: HashSet<String> = ["calico", "ar15", "cx4", "t_tree"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn tile_info_written_as_a_lone_object_is_accepted() {
        let fs = mock_fs(&[
            ("/gfx/ultica/tileset.txt", "JSON=tile_config.json\n"),
            (
                "/gfx/ultica/tile_config.json",
                r#"{ "tile_info": { "width": 10, "height": 20, "pixelscale": 2, "iso": true } }"#,
            ),
        ]);
        let tileset = Tileset::load(&fs, Path::new("/gfx/ultica")).expect("load tileset");
        let info = tileset.config().tile_info().expect("tile info");
        assert_eq!(info.pixel_scale(), 2);
        assert!(info.is_isometric());
        assert!(tileset.config().atlases().is_empty());
    }

    #[test]
    fn load_reports_each_missing_piece() {
        let fs = mock_fs(&[]);
        assert!(matches!(
            Tileset::load(&fs, Path::new("/gfx/missing")),
            Err(TilecovError::DirectoryNotFound(_))
        ));
        assert!(matches!(
            Tileset::load(&fs, Path::new("/gfx/ultica")),
            Err(TilecovError::MetadataNotFound(_))
        ));

        let fs = mock_fs(&[("/gfx/ultica/tileset.txt", "NAME=Ultica\n")]);
        match Tileset::load(&fs, Path::new("/gfx/ultica")) {
            Err(TilecovError::MissingConfigPath { tileset }) => assert_eq!(tileset, "Ultica"),
            other => panic!("expected MissingConfigPath, got {other:?}"),
        }

        let fs = mock_fs(&[("/gfx/ultica/tileset.txt", "NAME=Ultica\nJSON=tiles.json\n")]);
        match Tileset::load(&fs, Path::new("/gfx/ultica")) {
            Err(TilecovError::ConfigFileNotFound { path, .. }) => {
                assert_eq!(path, Path::new("/gfx/ultica/tiles.json"));
            }
            other => panic!("expected ConfigFileNotFound, got {other:?}"),
        }

        let fs = mock_fs(&[
            ("/gfx/ultica/tileset.txt", "JSON=tile_config.json\n"),
            ("/gfx/ultica/tile_config.json", "null"),
        ]);
        assert!(matches!(
            Tileset::load(&fs, Path::new("/gfx/ultica")),
            Err(TilecovError::NullConfigObject(_))
        ));
    }

    #[test]
    fn loads_from_a_real_directory() {
        let root = temp_root();
        let dir = root.join("gfx").join("retro");
        std::fs::create_dir_all(&dir).expect("create tileset dir");
        std::fs::write(dir.join(TILESET_METADATA), "NAME=retro\nVIEW=Retro\nJSON=config.json\n")
            .expect("write metadata");
        std::fs::write(
            dir.join("config.json"),
            r#"{ "tiles-new": [{ "file": "a.png", "tiles": [{ "id": "rock" }] }] }"#,
        )
        .expect("write config");

        let tileset = Tileset::load(&StdFileSystem::new(), &dir).expect("load tileset");
        assert_eq!(tileset.directory(), dir.as_path());
        assert!(tileset.tile_ids(&[]).contains("rock"));

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }
}
