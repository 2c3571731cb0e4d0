use pomwatch::patch::{apply_patch, is_already_patched, PATCH_MARKER, POM_ANCHOR};

const UNPATCHED_POM: &str = "\
<project>
\t<build>
\t\t<plugins>
\t\t\t<plugin>
\t\t\t\t<artifactId>maven-shade-plugin</artifactId>
\t\t\t\t<executions>
\t\t\t\t\t<execution>
\t\t\t\t\t\t<goals>
\t\t\t\t\t\t\t<goal>shade</goal>
\t\t\t\t\t\t</goals>
\t\t\t\t\t</execution>
\t\t\t\t</executions>
\t\t\t</plugin>
\t\t</plugins>
\t</build>
</project>
";

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn patch_inserts_exactly_one_relocation_block() {
    let patched = apply_patch(UNPATCHED_POM, "com.example.myplugin");

    assert_eq!(count_occurrences(&patched, PATCH_MARKER), 1);
    assert_eq!(
        count_occurrences(&patched, "<shadedPattern>com.example.myplugin.bstats</shadedPattern>"),
        1
    );
}

#[test]
fn marker_detection_flips_after_patch() {
    assert!(!is_already_patched(UNPATCHED_POM));

    let patched = apply_patch(UNPATCHED_POM, "com.example.myplugin");
    assert!(is_already_patched(&patched));
}

#[test]
fn unguarded_double_apply_inserts_two_blocks() {
    // apply_patch itself is unguarded; the loop's is_already_patched check is
    // what makes the overall cycle idempotent.
    let once = apply_patch(UNPATCHED_POM, "com.example.myplugin");
    let twice = apply_patch(&once, "com.example.myplugin");

    assert_eq!(count_occurrences(&twice, PATCH_MARKER), 2);
}

#[test]
fn content_without_anchor_is_returned_unchanged() {
    let no_anchor = "<project><build></build></project>";
    assert_eq!(apply_patch(no_anchor, "com.example.myplugin"), no_anchor);
}

#[test]
fn bytes_outside_the_insertion_point_are_preserved() {
    let patched = apply_patch(UNPATCHED_POM, "com.example.myplugin");

    let anchor_end = UNPATCHED_POM.find(POM_ANCHOR).unwrap() + POM_ANCHOR.len();
    let (prefix, suffix) = UNPATCHED_POM.split_at(anchor_end);

    assert!(patched.starts_with(prefix));
    assert!(patched.ends_with(suffix));
}

#[test]
fn only_the_first_anchor_is_used() {
    let two_anchors = format!("{UNPATCHED_POM}\n<goals></goals>");
    let patched = apply_patch(&two_anchors, "com.example.myplugin");

    let first_anchor = patched.find(POM_ANCHOR).unwrap();
    let marker = patched.find(PATCH_MARKER).unwrap();
    let last_anchor = patched.rfind(POM_ANCHOR).unwrap();

    assert!(first_anchor < marker);
    assert!(marker < last_anchor);
    assert_eq!(count_occurrences(&patched, PATCH_MARKER), 1);
}

#[test]
fn package_text_is_inserted_literally() {
    // `$` has meaning in regex replacement strings; it must come through
    // untouched.
    let patched = apply_patch(UNPATCHED_POM, "com.weird$name");
    assert!(patched.contains("<shadedPattern>com.weird$name.bstats</shadedPattern>"));
}
