use super::{Migration, MigrationError};

/// The ordered set of every known migration.
///
/// Order is plain byte-wise comparison of names. Every name carries a numeric
/// prefix of the same width, so lexical order and numeric order agree.
pub struct Catalog {
    migrations: Vec<Box<dyn Migration>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.migrations.iter().map(|m| m.name())).finish()
    }
}

impl Catalog {
    /// Validate and sort the given definitions. Fails on a malformed or duplicate name.
    pub fn new(mut migrations: Vec<Box<dyn Migration>>) -> Result<Self, MigrationError> {
        let mut prefix_width: Option<usize> = None;
        for m in &migrations {
            let width = validate_name(m.name())?;
            match prefix_width {
                None => prefix_width = Some(width),
                Some(w) if w != width => {
                    return Err(MigrationError::discovery(format!(
                        "migration {} has a {width}-digit prefix, expected {w}",
                        m.name()
                    )));
                }
                Some(_) => {}
            }
        }

        migrations.sort_by(|a, b| a.name().cmp(b.name()));
        if let Some(pair) = migrations.windows(2).find(|w| w[0].name() == w[1].name()) {
            return Err(MigrationError::discovery(format!(
                "duplicate migration name {}",
                pair[0].name()
            )));
        }

        Ok(Self { migrations })
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Migration> {
        self.position(name).ok().map(|i| self.migrations[i].as_ref())
    }

    /// Every name, ascending.
    pub fn sequence(&self) -> Vec<String> {
        self.migrations.iter().map(|m| m.name().to_string()).collect()
    }

    /// Names strictly before `boundary`. `boundary` itself must be in the catalog.
    pub fn sequence_before(&self, boundary: &str) -> Result<Vec<String>, MigrationError> {
        let idx = self
            .position(boundary)
            .map_err(|_| MigrationError::NotFound(boundary.to_string()))?;
        Ok(self.names(..idx))
    }

    /// Names up to and including `boundary`.
    pub fn sequence_through(&self, boundary: &str) -> Result<Vec<String>, MigrationError> {
        let idx = self
            .position(boundary)
            .map_err(|_| MigrationError::NotFound(boundary.to_string()))?;
        Ok(self.names(..=idx))
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.migrations.binary_search_by(|m| m.name().cmp(name))
    }

    fn names<R>(&self, range: R) -> Vec<String>
    where
        R: std::slice::SliceIndex<[Box<dyn Migration>], Output = [Box<dyn Migration>]>,
    {
        self.migrations[range]
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }
}

/// `NNN_description`: ASCII digits, an underscore, then a non-empty description
/// without whitespace. Returns the prefix width.
fn validate_name(name: &str) -> Result<usize, MigrationError> {
    let width = name.bytes().take_while(u8::is_ascii_digit).count();
    if width == 0 {
        return Err(MigrationError::discovery(format!(
            "migration name {name:?} has no numeric prefix"
        )));
    }
    let rest = &name[width..];
    let Some(description) = rest.strip_prefix('_') else {
        return Err(MigrationError::discovery(format!(
            "migration name {name:?} must separate its prefix with '_'"
        )));
    };
    if description.is_empty() || description.chars().any(char::is_whitespace) {
        return Err(MigrationError::discovery(format!(
            "migration name {name:?} has an invalid description"
        )));
    }
    Ok(width)
}
