//! Version normalization across the two repositories' tag vocabularies.
//!
//! Git tags look like `v2.80`, `v2.79b` or `v2.74-rc2`. Svn library tags look
//! like `blender-2.80-release` or `blender-2.76-winfix`. Both normalize into a
//! [`ComparableVersion`] so they can be joined by equality and sorted.
//!
//! # Ordering
//!
//! Versions compare by:
//! 1. numeric release segments (`2.9 < 2.10`, trailing zeros ignored),
//! 2. Blender's corrective letter (`2.79 < 2.79a < 2.79b`),
//! 3. pre-release marker (`alpha < beta < rc < final`),
//! 4. any unrecognized trailing label (none first, then lexicographic).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

static DECORATION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[-_.](?:release|winfix)\b").expect("decoration pattern is valid"));

static RELEASE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\d+(?:[._-]\d+)*").expect("release pattern is valid"));

static PRE_RELEASE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(alpha|beta|rc)(\d*)").expect("pre-release pattern is valid"));

/// Kind of a pre-release marker. Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
  Alpha,
  Beta,
  Rc,
}

impl PreKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Alpha => "alpha",
      Self::Beta => "beta",
      Self::Rc => "rc",
    }
  }
}

/// A pre-release marker such as `rc2` or `beta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
  pub kind: PreKind,
  pub number: u64,
}

/// A release identifier with decoration stripped, ordered as described in the
/// module docs.
#[derive(Debug, Clone)]
pub struct ComparableVersion {
  release: Vec<u64>,
  letter: Option<char>,
  pre: Option<PreRelease>,
  label: Option<String>,
}

impl ComparableVersion {
  /// Numeric release segments as written (`2.80` -> `[2, 80]`).
  pub fn release(&self) -> &[u64] {
    &self.release
  }

  /// Corrective-release letter, e.g. `b` for `2.79b`.
  pub fn letter(&self) -> Option<char> {
    self.letter
  }

  pub fn pre_release(&self) -> Option<PreRelease> {
    self.pre
  }

  /// Whether the tag carried at least one numeric release segment.
  ///
  /// Tags without one (`master`, `studio-sprite-fright`) are not releases and
  /// are filtered out by the tag sources.
  pub fn has_release(&self) -> bool {
    !self.release.is_empty()
  }

  pub fn is_pre_release(&self) -> bool {
    self.pre.is_some()
  }

  fn significant_release(&self) -> &[u64] {
    let end = self.release.iter().rposition(|&n| n != 0).map_or(0, |i| i + 1);
    &self.release[..end]
  }
}

impl PartialEq for ComparableVersion {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for ComparableVersion {}

impl PartialOrd for ComparableVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for ComparableVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .significant_release()
      .cmp(other.significant_release())
      .then_with(|| self.letter.cmp(&other.letter))
      .then_with(|| match (&self.pre, &other.pre) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
      })
      .then_with(|| self.label.cmp(&other.label))
  }
}

impl Hash for ComparableVersion {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.significant_release().hash(state);
    self.letter.hash(state);
    self.pre.hash(state);
    self.label.hash(state);
  }
}

impl fmt::Display for ComparableVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
    write!(f, "{}", release.join("."))?;
    if let Some(letter) = self.letter {
      write!(f, "{}", letter)?;
    }
    if let Some(pre) = self.pre {
      if !self.release.is_empty() {
        write!(f, "-")?;
      }
      write!(f, "{}", pre.kind.as_str())?;
      if pre.number > 0 {
        write!(f, "{}", pre.number)?;
      }
    }
    if let Some(label) = &self.label {
      if !self.release.is_empty() || self.pre.is_some() {
        write!(f, "-")?;
      }
      write!(f, "{}", label)?;
    }
    Ok(())
  }
}

impl Serialize for ComparableVersion {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl From<&str> for ComparableVersion {
  fn from(raw: &str) -> Self {
    normalize(raw)
  }
}

/// Normalize a raw tag from either repository.
///
/// Total: any input produces a value. Tags that are not releases at all end
/// up with an empty release and the whole text as label.
///
/// ```
/// use bpybuild_lib::version::normalize;
///
/// assert_eq!(normalize("blender-2.80-release"), normalize("v2.80"));
/// assert!(normalize("v2.74-rc2") < normalize("v2.74"));
/// ```
pub fn normalize(raw: &str) -> ComparableVersion {
  let lowered = raw.trim().to_ascii_lowercase();
  let cleaned = DECORATION.replace_all(strip_prefixes(&lowered), "");
  parse(&cleaned)
}

fn strip_prefixes(tag: &str) -> &str {
  let tag = tag
    .strip_prefix("blender")
    .map(|rest| rest.trim_start_matches(['-', '_']))
    .unwrap_or(tag);

  match tag.strip_prefix('v') {
    Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
    _ => tag,
  }
}

fn parse(tag: &str) -> ComparableVersion {
  let mut rest = tag;

  let mut release = Vec::new();
  if let Some(m) = RELEASE.find(rest) {
    release = m
      .as_str()
      .split(['.', '_', '-'])
      .map(|segment| segment.parse().unwrap_or(u64::MAX))
      .collect();
    rest = &rest[m.end()..];
  }

  // A lone letter glued to the release is a corrective release (`2.79b`),
  // a run of letters is a word such as `rc` and handled below.
  let mut letter = None;
  if !release.is_empty() {
    let mut chars = rest.chars();
    if let Some(c) = chars.next()
      && c.is_ascii_alphabetic()
      && !chars.next().is_some_and(|next| next.is_ascii_alphabetic())
    {
      letter = Some(c);
      rest = &rest[1..];
    }
  }

  let mut pre = None;
  let trimmed = rest.trim_start_matches(['.', '_', '-']);
  if let Some(caps) = PRE_RELEASE.captures(trimmed) {
    let kind = match &caps[1] {
      "alpha" => PreKind::Alpha,
      "beta" => PreKind::Beta,
      _ => PreKind::Rc,
    };
    let number = caps[2].parse().unwrap_or(0);
    pre = Some(PreRelease { kind, number });
    rest = &trimmed[caps[0].len()..];
  }

  let label = rest.trim_matches(['.', '_', '-']);

  ComparableVersion {
    release,
    letter,
    pre,
    label: (!label.is_empty()).then(|| label.to_string()),
  }
}
