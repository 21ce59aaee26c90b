use hkj_core::*;
use serde::Deserialize;
use serde::Serialize;

/// Named roster parameter. The rules never depend on the roster; only the
/// display names shown to clients change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeishaSet {
    #[default]
    Default,
    Akatsuki,
}

impl GeishaSet {
    /// Display names in catalog order, weakest charm first.
    fn names(&self) -> [&'static str; GEISHA_COUNT] {
        match self {
            Self::Default => [
                "Harumi", "Natsumi", "Akiko", "Fuyuko", "Sayaka", "Tomoe", "Kiyoha",
            ],
            Self::Akatsuki => [
                "Akari", "Hinata", "Rin", "Kaede", "Yuzuki", "Noeru", "Shiori",
            ],
        }
    }
}

impl std::str::FromStr for GeishaSet {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "akatsuki" => Ok(Self::Akatsuki),
            other => Err(format!("unknown geisha set: {}", other)),
        }
    }
}

/// One of the seven favor targets.
///
/// `controlled_by` persists across rounds within a game; it moves only when
/// one seat's played-card count for this geisha strictly exceeds the
/// opponent's at round end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geisha {
    pub id: GeishaId,
    pub name: String,
    pub charm: Charm,
    pub controlled_by: Option<PlayerId>,
}

/// Builds the seven-geisha catalog for a set, in deterministic order,
/// with no seat holding favor yet.
pub fn base_geishas(set: GeishaSet) -> Vec<Geisha> {
    set.names()
        .iter()
        .zip(CHARMS.iter())
        .enumerate()
        .map(|(i, (name, charm))| Geisha {
            id: i as GeishaId + 1,
            name: name.to_string(),
            charm: *charm,
            controlled_by: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn catalog_has_seven_geisha_totaling_21_charm() {
        for set in [GeishaSet::Default, GeishaSet::Akatsuki] {
            let geishas = base_geishas(set);
            assert_eq!(geishas.len(), GEISHA_COUNT);
            assert_eq!(geishas.iter().map(|g| g.charm as usize).sum::<usize>(), 21);
            assert!(geishas.iter().all(|g| g.controlled_by.is_none()));
        }
    }
    #[test]
    fn ids_run_one_through_seven() {
        let geishas = base_geishas(GeishaSet::Default);
        assert_eq!(
            geishas.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, 6, 7]
        );
    }
    #[test]
    fn set_keys_parse() {
        assert_eq!("default".parse::<GeishaSet>(), Ok(GeishaSet::Default));
        assert_eq!("akatsuki".parse::<GeishaSet>(), Ok(GeishaSet::Akatsuki));
        assert!("hololive".parse::<GeishaSet>().is_err());
    }
}
