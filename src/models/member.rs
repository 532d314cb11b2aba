//! Person records for tree members
//!
//! A record is read-only to the viewer: the tree only takes its display
//! fields, the detail panel takes the whole profile.

use serde::{Deserialize, Serialize};

/// Fields written into a member's node in the tree graphic
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFields {
    pub image: Option<String>,
    pub main_text: Option<String>,
    pub sub_text: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlternateName {
    pub name: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Two-line fact such as birth, death or a lived place
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    #[serde(default, alias = "main_text")]
    pub main_text: Option<String>,
    #[serde(default, alias = "sub_text")]
    pub sub_text: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub info: Option<String>,
}

/// Link from one person to another (spouse, child, parent, sibling)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Relative {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// "Mother", "Elder brother", ...
    #[serde(default)]
    pub relation: Option<String>,
    /// Spouses carry it as `marriageInfo`
    #[serde(default, alias = "marriageInfo", alias = "marriage_info")]
    pub info: Option<String>,
    /// Spouses only
    #[serde(default, alias = "marriage_fate")]
    pub marriage_fate: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Full person record, as stored in one member data file
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: String,
    #[serde(alias = "profile_pic")]
    pub profile_pic: Option<String>,
    #[serde(alias = "main_title")]
    pub main_title: Option<String>,
    #[serde(alias = "sub_title")]
    pub sub_title: Option<String>,

    #[serde(alias = "short_name")]
    pub short_name: Option<String>,
    #[serde(alias = "full_name")]
    pub full_name: Option<String>,
    pub lineage: Option<String>,
    pub gender: Option<String>,
    pub description: Option<String>,

    #[serde(alias = "alternate_names")]
    pub alternate_names: Vec<AlternateName>,
    pub birth: Option<LifeEvent>,
    pub death: Option<LifeEvent>,
    #[serde(alias = "lived_places")]
    pub lived_places: Vec<LifeEvent>,
    pub roles: Vec<Role>,

    pub spouses: Vec<Relative>,
    pub children: Vec<Relative>,
    pub parents: Vec<Relative>,
    pub siblings: Vec<Relative>,
    pub sources: Vec<Source>,
}

impl PersonRecord {
    pub fn display_fields(&self) -> DisplayFields {
        DisplayFields {
            image: self.profile_pic.clone(),
            main_text: self.main_title.clone(),
            sub_text: self.sub_title.clone(),
        }
    }

    /// Every name this person can be searched by
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.main_title
            .iter()
            .chain(self.short_name.iter())
            .chain(self.full_name.iter())
            .map(String::as_str)
            .chain(self.alternate_names.iter().map(|a| a.name.as_str()))
    }
}

/// Result of a search-by-name
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SearchOutcome {
    EmptyQuery,
    NotFound,
    Found(String),
    Multiple(Vec<String>),
}

impl SearchOutcome {
    /// Message shown under the search box, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SearchOutcome::EmptyQuery => Some("Please enter a name to search."),
            SearchOutcome::NotFound => Some("The member is not found!"),
            SearchOutcome::Multiple(_) => Some("Multiple members found!"),
            SearchOutcome::Found(_) => None,
        }
    }
}
