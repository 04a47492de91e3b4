use serde::Serialize;

use crate::analysis::grouping::Group;
use crate::analysis::scrollable::ScrollConf;
use crate::analysis::similarity::MatchConf;
use crate::analysis::Screen;

/// Name of the manifest file written next to the processed screens.
pub const MANIFEST_FILENAME: &str = "screens.json";

/// Header height hint consumers use to pin the top of scrollable screens.
const PINNED_HEADER_HEIGHT: &str = "15%";

/// One manifest entry. Serializes with a lowercase `type` tag so consumers
/// can dispatch on it.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScreenRecord {
    Static {
        src: String,
        id: String,
    },
    Scrollable {
        src: String,
        id: String,
        images: Vec<String>,
        #[serde(rename = "pinnedHeaderHeight")]
        pinned_header_height: String,
    },
}

/// Turns the grouped screens into manifest records.
///
/// Singleton groups become static screens. Larger groups become one
/// scrollable screen when they pass the scroll heuristic, otherwise they
/// are demoted to individual static screens with ids derived from their
/// seed so near duplicates stay recognizable.
pub fn build_records(
    screens: &[Screen],
    groups: &[Group],
    asset_prefix: &str,
    scroll: &ScrollConf,
    matcher: &MatchConf,
) -> Vec<ScreenRecord> {
    let mut records = Vec::new();

    for group in groups {
        let seed = &screens[group.seed()];
        if group.member_count() == 1 {
            records.push(ScreenRecord::Static {
                src: asset_path(asset_prefix, seed.name()),
                id: stem(seed.name()),
            });
            continue;
        }

        let others: Vec<&Screen> = group.members()[1..]
            .iter()
            .map(|&m| &screens[m])
            .collect();
        if scroll.is_scrollable(seed, &others, matcher) {
            log::info!(
                target: "manifest",
                "{}: scrollable screen with {} captures",
                seed.name(),
                group.member_count()
            );
            records.push(ScreenRecord::Scrollable {
                src: asset_path(asset_prefix, seed.name()),
                id: stem(seed.name()),
                images: group
                    .members()
                    .iter()
                    .map(|&m| asset_path(asset_prefix, screens[m].name()))
                    .collect(),
                pinned_header_height: PINNED_HEADER_HEIGHT.to_owned(),
            });
        } else {
            log::info!(
                target: "manifest",
                "{}: {} near duplicates kept as separate screens",
                seed.name(),
                group.member_count()
            );
            let seed_stem = stem(seed.name());
            for &m in group.members() {
                let member = &screens[m];
                records.push(ScreenRecord::Static {
                    src: asset_path(asset_prefix, member.name()),
                    id: format!("{seed_stem}_{}", stem(member.name())),
                });
            }
        }
    }

    records
}

fn asset_path(prefix: &str, name: &str) -> String {
    format!("{prefix}/{name}")
}

/// The file name without its extension.
fn stem(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem.to_owned(),
        None => name.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn static_record_shape() {
        let record = ScreenRecord::Static {
            src: "assets/screens/home.jpg".to_owned(),
            id: "home".to_owned(),
        };

        let expected = json!({
            "type": "static",
            "src": "assets/screens/home.jpg",
            "id": "home",
        });
        assert_eq!(expected, serde_json::to_value(&record).unwrap());
    }

    #[test]
    fn scrollable_record_shape() {
        let record = ScreenRecord::Scrollable {
            src: "assets/screens/feed.jpg".to_owned(),
            id: "feed".to_owned(),
            images: vec![
                "assets/screens/feed.jpg".to_owned(),
                "assets/screens/feed_2.jpg".to_owned(),
            ],
            pinned_header_height: PINNED_HEADER_HEIGHT.to_owned(),
        };

        let expected = json!({
            "type": "scrollable",
            "src": "assets/screens/feed.jpg",
            "id": "feed",
            "images": ["assets/screens/feed.jpg", "assets/screens/feed_2.jpg"],
            "pinnedHeaderHeight": "15%",
        });
        assert_eq!(expected, serde_json::to_value(&record).unwrap());
    }

    #[test]
    fn stem_strips_only_the_last_extension() {
        assert_eq!("home", stem("home.jpg"));
        assert_eq!("a.b", stem("a.b.jpg"));
        assert_eq!("noext", stem("noext"));
    }
}
