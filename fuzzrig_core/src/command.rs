use std::path::Path;

/// Placeholder replaced with the joined compiler option string.
pub const TOKEN_COMPBASE: &str = "COMPBASE";
/// Placeholder replaced with the driver (or test) source path.
pub const TOKEN_OUTFILE: &str = "OUTFILE";
/// Placeholder replaced with the output executable path.
pub const TOKEN_OUTEXE: &str = "OUTEXE";
/// Placeholder replaced with the crash artifact directory.
pub const TOKEN_ARTIFACTDIR: &str = "ARTIFACTDIR";
/// Placeholder replaced with the seed corpus directory.
pub const TOKEN_SEEDDIR: &str = "SEEDDIR";

/// Warning suppressions appended to every native compile-option list.
/// Generated drivers routinely trip these and the noise drowns real errors.
const WARNING_SUPPRESSION_FLAGS: [&str; 4] = [
    "-Wno-unused-variable",
    "-Wno-newline-eof",
    "-Wno-unused-but-set-variable",
    "-Wno-implicit-function-declaration",
];

/// Fuzzing sanitizer link flags stripped from test builds, in this order.
/// Test binaries link as ordinary executables, not as fuzz targets.
const SANITIZER_LINK_FLAGS: [&str; 2] = ["-fsanitize=fuzzer-no-link", "-fsanitize=fuzzer"];

/// Returns the caller's compile options with the fixed warning suppressions
/// appended.
pub fn with_warning_suppression(opts: &[String]) -> Vec<String> {
    let mut extended = opts.to_vec();
    extended.extend(WARNING_SUPPRESSION_FLAGS.iter().map(|f| f.to_string()));
    extended
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Renders a build command template.
///
/// Substitution is literal substring replacement in a fixed order: COMPBASE,
/// then OUTFILE, then OUTEXE. Tokens absent from the template are left
/// untouched. Replacement values are assumed not to contain tokens
/// themselves; that assumption is not verified.
pub fn render_build_command(
    template: &str,
    compile_opts: &[String],
    outfile: &Path,
    outexe: &Path,
) -> String {
    template
        .replace(TOKEN_COMPBASE, &compile_opts.join(" "))
        .replace(TOKEN_OUTFILE, &path_str(outfile))
        .replace(TOKEN_OUTEXE, &path_str(outexe))
}

/// Renders the test-build variant of a build command template.
///
/// Identical to [`render_build_command`] against the test source/executable
/// pair, followed by stripping the fuzzing sanitizer link flags as exact
/// substrings.
pub fn render_test_build_command(
    template: &str,
    compile_opts: &[String],
    test_source: &Path,
    test_exe: &Path,
) -> String {
    let mut rendered = render_build_command(template, compile_opts, test_source, test_exe);
    for flag in SANITIZER_LINK_FLAGS {
        rendered = rendered.replace(flag, "");
    }
    rendered
}

/// Renders a run command template: OUTEXE, then ARTIFACTDIR, then SEEDDIR.
pub fn render_run_command(
    template: &str,
    outexe: &Path,
    artifact_dir: &Path,
    seed_dir: &Path,
) -> String {
    template
        .replace(TOKEN_OUTEXE, &path_str(outexe))
        .replace(TOKEN_ARTIFACTDIR, &path_str(artifact_dir))
        .replace(TOKEN_SEEDDIR, &path_str(seed_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn opts(flags: &[&str]) -> Vec<String> {
        flags.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn build_command_substitutes_all_tokens() {
        let rendered = render_build_command(
            "clang COMPBASE OUTFILE -o OUTEXE",
            &opts(&["-I/inc", "-g"]),
            &PathBuf::from("/w/dummyfuzzer.c"),
            &PathBuf::from("/w/dummyfuzzer"),
        );
        assert_eq!(
            rendered,
            "clang -I/inc -g /w/dummyfuzzer.c -o /w/dummyfuzzer"
        );
    }

    #[test]
    fn absent_tokens_are_never_replaced() {
        let rendered = render_build_command(
            "make fuzzer",
            &opts(&["-O2"]),
            &PathBuf::from("/w/f.c"),
            &PathBuf::from("/w/f"),
        );
        assert_eq!(rendered, "make fuzzer");
    }

    #[test]
    fn substitution_is_literal_not_pattern_based() {
        // A template mentioning OUTFILE twice gets both occurrences replaced;
        // partial overlaps like NOUTFILEX are also replaced literally.
        let rendered = render_build_command(
            "cp OUTFILE OUTFILE.bak",
            &opts(&[]),
            &PathBuf::from("/w/f.c"),
            &PathBuf::from("/w/f"),
        );
        assert_eq!(rendered, "cp /w/f.c /w/f.c.bak");
    }

    #[test]
    fn warning_suppression_is_appended_after_caller_options() {
        let extended = with_warning_suppression(&opts(&["-I/inc"]));
        assert_eq!(extended[0], "-I/inc");
        assert_eq!(extended.len(), 5);
        assert_eq!(extended[1], "-Wno-unused-variable");
        assert_eq!(extended[4], "-Wno-implicit-function-declaration");
    }

    #[test]
    fn test_build_strips_sanitizer_link_flags() {
        let rendered = render_test_build_command(
            "clang COMPBASE OUTFILE -o OUTEXE",
            &opts(&["-fsanitize=fuzzer-no-link", "-fsanitize=fuzzer", "-O1"]),
            &PathBuf::from("/w/dummytester.c"),
            &PathBuf::from("/w/dummytester"),
        );
        assert!(!rendered.contains("-fsanitize=fuzzer"));
        assert!(rendered.contains("-O1"));
        assert!(rendered.contains("/w/dummytester.c"));
        assert!(rendered.ends_with("-o /w/dummytester"));
    }

    #[test]
    fn run_command_substitutes_exe_and_directories() {
        let rendered = render_run_command(
            "OUTEXE -artifact_prefix=ARTIFACTDIR/ SEEDDIR",
            &PathBuf::from("/w/dummyfuzzer"),
            &PathBuf::from("/w/artifact"),
            &PathBuf::from("/w/seeds"),
        );
        assert_eq!(rendered, "/w/dummyfuzzer -artifact_prefix=/w/artifact/ /w/seeds");
    }

    #[test]
    fn rendering_is_idempotent_when_values_carry_no_tokens() {
        let outfile = PathBuf::from("/w/f.c");
        let outexe = PathBuf::from("/w/f");
        let once = render_build_command("cc COMPBASE OUTFILE -o OUTEXE", &opts(&["-g"]), &outfile, &outexe);
        let twice = render_build_command(&once, &opts(&["-g"]), &outfile, &outexe);
        assert_eq!(once, twice);
    }
}
