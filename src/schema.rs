// Resolution of logical field roles to physical column indices.
//
// Column labels drift between report versions, so every role carries an
// ordered list of matchers. Names are compared "squashed": lowercased with
// all whitespace removed. For each role the first matcher that hits any
// column wins, and within a matcher the left-most column wins.
use crate::error::{ReportError, Result};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldRole {
    Identifier,
    ProjectName,
    Capacity,
    Fuel,
    Technology,
    County,
    CompletionDate,
    Status,
    StudyPhase,
    ChangeIndicator,
}

impl FieldRole {
    pub const ALL: [FieldRole; 10] = [
        FieldRole::Identifier,
        FieldRole::ProjectName,
        FieldRole::Capacity,
        FieldRole::Fuel,
        FieldRole::Technology,
        FieldRole::County,
        FieldRole::CompletionDate,
        FieldRole::Status,
        FieldRole::StudyPhase,
        FieldRole::ChangeIndicator,
    ];

    /// The label used in the known report layout.
    pub fn label(self) -> &'static str {
        match self {
            FieldRole::Identifier => "INR",
            FieldRole::ProjectName => "Project Name",
            FieldRole::Capacity => "Capacity (MW)",
            FieldRole::Fuel => "Fuel",
            FieldRole::Technology => "Technology",
            FieldRole::County => "County",
            FieldRole::CompletionDate => "Projected COD",
            FieldRole::Status => "Status",
            FieldRole::StudyPhase => "GIM Study Phase",
            FieldRole::ChangeIndicator => "Change Indicators",
        }
    }

    fn matchers(self) -> &'static [Matcher] {
        use Matcher::{Contains, Exact};
        match self {
            FieldRole::Identifier => &[Exact("inr"), Exact("inrnumber")],
            FieldRole::ProjectName => &[Exact("projectname"), Contains("projectname")],
            FieldRole::Capacity => &[
                Exact("capacity(mw)"),
                Contains("capacity(mw)"),
                Contains("capacity"),
            ],
            FieldRole::Fuel => &[Exact("fuel"), Exact("fueltype"), Contains("fuel")],
            FieldRole::Technology => &[Exact("technology"), Contains("technology")],
            FieldRole::County => &[Exact("county"), Contains("county")],
            FieldRole::CompletionDate => &[
                Exact("projectedcod"),
                Contains("projectedcod"),
                Contains("commercialoperationdate"),
            ],
            FieldRole::Status => &[Exact("status"), Contains("projectstatus"), Contains("status")],
            FieldRole::StudyPhase => &[Exact("gimstudyphase"), Contains("studyphase")],
            FieldRole::ChangeIndicator => &[
                Contains("changeindicator"),
                Contains("changesfromlast"),
                Contains("changeflag"),
            ],
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy)]
enum Matcher {
    Exact(&'static str),
    Contains(&'static str),
}

impl Matcher {
    fn matches(self, squashed: &str) -> bool {
        match self {
            Matcher::Exact(s) => squashed == s,
            Matcher::Contains(s) => squashed.contains(s),
        }
    }
}

/// Lowercase and drop whitespace, so `"Change  Indicators"` and
/// `"CHANGE INDICATORS"` compare equal.
pub fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    roles: BTreeMap<FieldRole, usize>,
}

impl Schema {
    /// Match every role against the resolved column names. Built once per
    /// file.
    pub fn resolve(columns: &[String]) -> Self {
        let squashed: Vec<String> = columns.iter().map(|c| squash(c)).collect();
        let mut roles = BTreeMap::new();
        for role in FieldRole::ALL {
            let hit = role
                .matchers()
                .iter()
                .find_map(|m| squashed.iter().position(|name| m.matches(name)));
            if let Some(idx) = hit {
                roles.insert(role, idx);
            }
        }
        Schema { roles }
    }

    pub fn index(&self, role: FieldRole) -> Option<usize> {
        self.roles.get(&role).copied()
    }

    pub fn has(&self, role: FieldRole) -> bool {
        self.roles.contains_key(&role)
    }

    /// Column index of the INR column, or `IdentifierColumnMissing` naming
    /// which snapshot (`side`) lacked it.
    pub fn require_identifier(&self, side: &str) -> Result<usize> {
        let role = FieldRole::Identifier;
        self.index(role)
            .ok_or_else(|| ReportError::IdentifierColumnMissing {
                column: role.label().to_string(),
                side: side.to_string(),
            })
    }

    pub fn missing(&self) -> Vec<FieldRole> {
        FieldRole::ALL
            .into_iter()
            .filter(|r| !self.has(*r))
            .collect()
    }
}
