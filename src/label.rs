//! Output labels of the tagger and the packed component types stored in the
//! component phrase dictionary.
//!
//! The two are separate types: [`Label`] is what the decoder scores,
//! [`ComponentType`]/[`ComponentSet`] describe which components a known phrase
//! has been seen as. [`ComponentType::label`] connects them.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Tagger labels in their fixed enumeration order.
///
/// The order is also the tie-break order: when two labels score the same,
/// the one listed first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "house")]
    House,
    #[serde(rename = "house_number")]
    HouseNumber,
    #[serde(rename = "road")]
    Road,
    #[serde(rename = "suburb")]
    Suburb,
    #[serde(rename = "city_district")]
    CityDistrict,
    #[serde(rename = "city")]
    City,
    #[serde(rename = "state_district")]
    StateDistrict,
    #[serde(rename = "state")]
    State,
    #[serde(rename = "postcode")]
    Postcode,
    #[serde(rename = "country")]
    Country,
    /// Separator inside a field, e.g. the hyphen in "12-14".
    #[serde(rename = "sep")]
    Separator,
    /// Separator between fields, e.g. a comma.
    #[serde(rename = "fsep")]
    FieldSeparator,
    /// History placeholder before the first token. Never scored or emitted.
    #[serde(rename = "start")]
    Start,
}

/// Number of labels that carry a weight column.
pub const NUM_CLASSES: usize = 12;

impl Label {
    /// Every scored label, in tie-break order.
    pub const CLASSES: [Label; NUM_CLASSES] = [
        Label::House,
        Label::HouseNumber,
        Label::Road,
        Label::Suburb,
        Label::CityDistrict,
        Label::City,
        Label::StateDistrict,
        Label::State,
        Label::Postcode,
        Label::Country,
        Label::Separator,
        Label::FieldSeparator,
    ];

    /// Candidates for ordinary (non-separator) tokens.
    pub const COMPONENTS: [Label; 10] = [
        Label::House,
        Label::HouseNumber,
        Label::Road,
        Label::Suburb,
        Label::CityDistrict,
        Label::City,
        Label::StateDistrict,
        Label::State,
        Label::Postcode,
        Label::Country,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Label::House => "house",
            Label::HouseNumber => "house_number",
            Label::Road => "road",
            Label::Suburb => "suburb",
            Label::CityDistrict => "city_district",
            Label::City => "city",
            Label::StateDistrict => "state_district",
            Label::State => "state",
            Label::Postcode => "postcode",
            Label::Country => "country",
            Label::Separator => "sep",
            Label::FieldSeparator => "fsep",
            Label::Start => "start",
        }
    }

    /// Parses a label name, case-insensitively. `start` is not accepted.
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.to_ascii_lowercase();
        Label::CLASSES.iter().copied().find(|l| l.name() == s)
    }

    /// Weight column, `None` for [`Label::Start`].
    pub fn index(self) -> Option<usize> {
        match self {
            Label::Start => None,
            l => Some(l as usize),
        }
    }

    pub fn is_structural(self) -> bool {
        matches!(self, Label::Separator | Label::FieldSeparator | Label::Start)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Address component kinds as stored in phrase type records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum ComponentType {
    House = 0,
    HouseNumber,
    Road,
    Suburb,
    CityDistrict,
    City,
    StateDistrict,
    State,
    PostalCode,
    Country,
}

impl ComponentType {
    pub const ALL: [ComponentType; 10] = [
        ComponentType::House,
        ComponentType::HouseNumber,
        ComponentType::Road,
        ComponentType::Suburb,
        ComponentType::CityDistrict,
        ComponentType::City,
        ComponentType::StateDistrict,
        ComponentType::State,
        ComponentType::PostalCode,
        ComponentType::Country,
    ];

    pub fn from_u16(v: u16) -> Option<Self> {
        ComponentType::ALL.get(v as usize).copied()
    }

    pub fn label(self) -> Label {
        match self {
            ComponentType::House => Label::House,
            ComponentType::HouseNumber => Label::HouseNumber,
            ComponentType::Road => Label::Road,
            ComponentType::Suburb => Label::Suburb,
            ComponentType::CityDistrict => Label::CityDistrict,
            ComponentType::City => Label::City,
            ComponentType::StateDistrict => Label::StateDistrict,
            ComponentType::State => Label::State,
            ComponentType::PostalCode => Label::Postcode,
            ComponentType::Country => Label::Country,
        }
    }

    pub fn flag(self) -> ComponentSet {
        match self {
            ComponentType::House => ComponentSet::HOUSE,
            ComponentType::HouseNumber => ComponentSet::HOUSE_NUMBER,
            ComponentType::Road => ComponentSet::ROAD,
            ComponentType::Suburb => ComponentSet::SUBURB,
            ComponentType::CityDistrict => ComponentSet::CITY_DISTRICT,
            ComponentType::City => ComponentSet::CITY,
            ComponentType::StateDistrict => ComponentSet::STATE_DISTRICT,
            ComponentType::State => ComponentSet::STATE,
            ComponentType::PostalCode => ComponentSet::POSTAL_CODE,
            ComponentType::Country => ComponentSet::COUNTRY,
        }
    }
}

bitflags! {
    /// Components a phrase has been observed as. Bit positions follow the
    /// trained dictionaries, hence the gaps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ComponentSet: u16 {
        const HOUSE = 1 << 0;
        const HOUSE_NUMBER = 1 << 1;
        const ROAD = 1 << 4;
        const SUBURB = 1 << 7;
        const CITY_DISTRICT = 1 << 8;
        const CITY = 1 << 9;
        const STATE_DISTRICT = 1 << 10;
        const STATE = 1 << 11;
        const POSTAL_CODE = 1 << 12;
        const COUNTRY = 1 << 13;
    }
}

/// Component phrase record: the set of components plus the single most
/// frequent one. Packs into a `u32` with the set in the low half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AddressParserTypes {
    pub components: ComponentSet,
    pub most_common: ComponentType,
}

impl AddressParserTypes {
    pub fn new(components: ComponentSet, most_common: ComponentType) -> Self {
        Self { components: components | most_common.flag(), most_common }
    }

    pub fn pack(self) -> u32 {
        self.components.bits() as u32 | (self.most_common as u32) << 16
    }

    /// `None` when the upper half is not a component type.
    pub fn unpack(v: u32) -> Option<Self> {
        let most_common = ComponentType::from_u16((v >> 16) as u16)?;
        Some(Self {
            components: ComponentSet::from_bits_truncate(v as u16),
            most_common,
        })
    }
}
