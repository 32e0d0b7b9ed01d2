//! Profile (demographic) fields.
//!
//! Accounts carry a fixed set of free-form profile attributes collected by
//! the registration and profile forms. Some are free text, others are
//! chosen from a fixed list of values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One choice of a select-style profile field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectChoice {
    /// Stored value.
    pub value: &'static str,
    /// Display label.
    pub label: &'static str,
}

const fn choice(value: &'static str) -> SelectChoice {
    SelectChoice {
        value,
        label: value,
    }
}

/// The empty "no selection" choice every select field starts with.
pub const NO_SELECTION: SelectChoice = SelectChoice {
    value: "",
    label: "--",
};

const SEX_CHOICES: &[SelectChoice] = &[NO_SELECTION, choice("Hombre"), choice("Mujer")];

const EDUCATION_CHOICES: &[SelectChoice] = &[
    NO_SELECTION,
    choice("Primaria"),
    choice("Secundaria"),
    choice("Técnica/ Vocacional"),
    choice("Medio Superior"),
    choice("Licenciatura"),
    choice("Maestría"),
    choice("Doctorado"),
];

const OCCUPATION_CHOICES: &[SelectChoice] = &[
    NO_SELECTION,
    choice("Estudiante"),
    choice("Profesor"),
    choice("Investigador"),
    choice("Consultor"),
    choice("Asesor"),
    choice("Analista"),
    choice("Funcionario Público"),
    choice("Profesionista independiente"),
    choice("Empleado"),
    choice("Personal administrativo"),
];

const ORGANIZATION_TYPE_CHOICES: &[SelectChoice] = &[
    NO_SELECTION,
    choice("Pública"),
    choice("Privada"),
    choice("Social"),
];

const ORGANIZATION_ACTIVITY_CHOICES: &[SelectChoice] = &[
    NO_SELECTION,
    choice("Educación"),
    choice("Investigación"),
    choice("Consultoría"),
    choice("Comercial"),
    choice("Servicios"),
    choice("Industrial"),
];

const INFORMATION_USE_CHOICES: &[SelectChoice] = &[
    NO_SELECTION,
    choice("Investigación"),
    choice("Docencia"),
    choice("Desarrollo de política pública"),
    choice("Desarrollo de planes y programas"),
    choice("Artículos de difusión/ opinión pública."),
    choice("Toma de decisiones organizacionales"),
    choice("Estudios de Mercado"),
    choice("Trabajo Escolar"),
];

/// A profile attribute of an account.
///
/// The declaration order is the order the forms display the fields in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    /// Sex.
    Sex,
    /// Age.
    Age,
    /// Highest education level.
    Education,
    /// Occupation.
    Occupation,
    /// Occupation not covered by the occupation choices.
    OtherOccupation,
    /// Organization name.
    Organization,
    /// Organization type.
    OrganizationType,
    /// Organization type not covered by the choices.
    OtherOrganizationType,
    /// Main activity of the organization.
    OrganizationActivity,
    /// Organization activity not covered by the choices.
    OtherOrganizationActivity,
    /// Country.
    Country,
    /// State or province.
    State,
    /// Intended use of the repository's information.
    InformationUse,
    /// Information use not covered by the choices.
    OtherInformationUse,
    /// Telephone number.
    Phone,
}

impl ProfileField {
    /// All profile fields in display order.
    pub const ALL: [Self; 15] = [
        Self::Sex,
        Self::Age,
        Self::Education,
        Self::Occupation,
        Self::OtherOccupation,
        Self::Organization,
        Self::OrganizationType,
        Self::OtherOrganizationType,
        Self::OrganizationActivity,
        Self::OtherOrganizationActivity,
        Self::Country,
        Self::State,
        Self::InformationUse,
        Self::OtherInformationUse,
        Self::Phone,
    ];

    /// Returns the form parameter name of this field.
    #[must_use]
    pub const fn param_name(self) -> &'static str {
        match self {
            Self::Sex => "sex",
            Self::Age => "age",
            Self::Education => "education",
            Self::Occupation => "occupation",
            Self::OtherOccupation => "other_occupation",
            Self::Organization => "organization",
            Self::OrganizationType => "organization_type",
            Self::OtherOrganizationType => "other_organization_type",
            Self::OrganizationActivity => "organization_activity",
            Self::OtherOrganizationActivity => "other_organization_activity",
            Self::Country => "country",
            Self::State => "state",
            Self::InformationUse => "information_use",
            Self::OtherInformationUse => "other_information_use",
            Self::Phone => "phone",
        }
    }

    /// Looks a field up by its form parameter name.
    #[must_use]
    pub fn from_param_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.param_name() == name)
    }

    /// Message key of the field label.
    #[must_use]
    pub fn label_key(self) -> String {
        format!("profile.field.{}", self.param_name())
    }

    /// Message key of the help text, for the free-text "other" fields.
    #[must_use]
    pub fn help_key(self) -> Option<String> {
        matches!(
            self,
            Self::OtherOccupation
                | Self::OtherOrganizationType
                | Self::OtherOrganizationActivity
                | Self::OtherInformationUse
        )
        .then(|| format!("profile.field.{}.help", self.param_name()))
    }

    /// Returns the fixed choices of a select field, or `None` for free text.
    #[must_use]
    pub const fn choices(self) -> Option<&'static [SelectChoice]> {
        match self {
            Self::Sex => Some(SEX_CHOICES),
            Self::Education => Some(EDUCATION_CHOICES),
            Self::Occupation => Some(OCCUPATION_CHOICES),
            Self::OrganizationType => Some(ORGANIZATION_TYPE_CHOICES),
            Self::OrganizationActivity => Some(ORGANIZATION_ACTIVITY_CHOICES),
            Self::InformationUse => Some(INFORMATION_USE_CHOICES),
            _ => None,
        }
    }

    /// Whether the forms mark this field as required.
    ///
    /// Only a visual marker; submissions without it are accepted.
    #[must_use]
    pub const fn marked_required(self) -> bool {
        matches!(self, Self::Organization)
    }

    /// Whether the forms start the organization section before this field.
    #[must_use]
    pub const fn starts_organization_section(self) -> bool {
        matches!(self, Self::Organization)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param_name())
    }
}
