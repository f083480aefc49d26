//! Stub compiler scripts.
//!
//! Each stub reads source from stdin, prints a report on stdout, and writes
//! `output.asm` into its working directory, like the real compiler.

/// Behaves like the reference compiler for the canonical sample.
///
/// `dhoro x = 10;` compiles to `MOV x, 10` with one keyword and one
/// identifier. Any other input is echoed into the artifact as a comment.
pub const REFERENCE: &str = r#"src=$(cat)
case "$src" in
  *"dhoro x = 10;"*)
    printf 'MOV x, 10' > output.asm
    echo "Tokens scanned"
    echo "KEYWORDS: 1"
    echo "IDENTIFIERS: 1"
    ;;
  *)
    printf '; %s' "$src" > output.asm
    echo "KEYWORDS: 0"
    echo "IDENTIFIERS: 0"
    ;;
esac
"#;

/// Writes the source verbatim as the artifact, then lingers before reporting.
///
/// The delay keeps concurrent invocations overlapping, so each test can check
/// that every response carries its own source back.
pub const ECHO_SLOW: &str = r#"src=$(cat)
printf '%s' "$src" > output.asm
sleep 0.3
echo "KEYWORDS: 2"
echo "IDENTIFIERS: 3"
"#;

/// Rejects every input with a diagnostic on stderr and no stdout.
pub const SYNTAX_ERROR: &str = r#"cat > /dev/null
echo "line 1: unexpected token" >&2
exit 1
"#;

/// Exits non-zero after printing a report; the output still counts.
pub const FAIL_WITH_OUTPUT: &str = r#"cat > /dev/null
echo "KEYWORDS: 5"
echo "IDENTIFIERS: 6"
exit 2
"#;

/// Succeeds without printing anything or writing an artifact.
pub const SILENT: &str = "cat > /dev/null\n";

/// Prints a report but writes no artifact.
pub const NO_ARTIFACT: &str = r#"cat > /dev/null
echo "keywords: 4"
"#;

/// Never finishes on its own.
pub const HANG: &str = "cat > /dev/null\nexec sleep 30\n";
