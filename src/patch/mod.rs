// src/patch/mod.rs

//! Content-aware patching of the generated `pom.xml`.
//!
//! The patch inserts a maven-shade-plugin relocation block for the
//! `org.bstats` namespace directly after the first `</goals>` tag. Two
//! substrings drive everything:
//!
//! - the **anchor** (`</goals>`): where the block is inserted;
//! - the **marker** (`<pattern>org.bstats</pattern>`): a substring that only
//!   ever appears inside an inserted block, so its presence means a previous
//!   cycle already patched this file.
//!
//! `apply_patch` itself is deliberately unguarded: calling it twice inserts
//! two blocks. Callers must check [`is_already_patched`] first; the watcher
//! loop does exactly that once per descriptor event.

pub mod template;

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

pub use template::MetricsTemplate;

/// Insertion point: end of the shade plugin's `<goals>` element.
pub const POM_ANCHOR: &str = "</goals>";

/// Idempotence marker: present iff a relocation block was already inserted.
pub const PATCH_MARKER: &str = "<pattern>org.bstats</pattern>";

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</goals>").expect("anchor regex is valid"));

/// Returns true if `content` already carries the relocation block.
pub fn is_already_patched(content: &str) -> bool {
    content.contains(PATCH_MARKER)
}

/// Insert the relocation block after the first anchor occurrence.
///
/// Returns the content unchanged when no anchor is present; the descriptor
/// may not yet contain the shade plugin section, and that is a no-op rather
/// than an error. Everything outside the single insertion point is preserved
/// byte-for-byte.
pub fn apply_patch(content: &str, package: &str) -> String {
    let replacement = format!("{POM_ANCHOR}\n{}", relocation_block(package));
    ANCHOR_RE
        .replace(content, NoExpand(&replacement))
        .into_owned()
}

/// The inserted block, indented to sit inside the shade plugin `<execution>`
/// element of a generated pom.
fn relocation_block(package: &str) -> String {
    format!(
        "\t\t\t\t\t\t<configuration>\n\
         \t\t\t\t\t\t\t<relocations>\n\
         \t\t\t\t\t\t\t\t<relocation>\n\
         \t\t\t\t\t\t\t\t\t<pattern>org.bstats</pattern>\n\
         \t\t\t\t\t\t\t\t\t<shadedPattern>{package}.bstats</shadedPattern>\n\
         \t\t\t\t\t\t\t\t</relocation>\n\
         \t\t\t\t\t\t\t</relocations>\n\
         \t\t\t\t\t\t</configuration>"
    )
}
