//! Comments stay attached to their sections and options

use strataconf::{CommentedIni, IniError};

const EDITED: &str = "\
; window geometry
[Window]
; pixels
width = 800
height = 600

[Flags]
verbose
";

#[test]
fn comments_survive_read_write_read() {
    let mut ini = CommentedIni::new();
    ini.read_str(EDITED).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("app.ini");
    ini.write_path(&path).unwrap();

    let mut again = CommentedIni::new();
    again.read_path(&path).unwrap();
    assert_eq!(again, ini);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), EDITED);
    assert_eq!(again.get("Flags", "verbose").unwrap(), None);
    assert_eq!(again.options_with_comment("Window"), vec!["width"]);
}

#[test]
fn editing_comments() {
    let mut ini = CommentedIni::new();
    ini.read_str(EDITED).unwrap();

    ini.set_comment("Window", "height", "pixels too").unwrap();
    ini.set_section_comment("Flags", "switches").unwrap();
    assert!(ini.remove_comment("Window", "width").unwrap());
    ini.set_section_comment("Window", "").unwrap();

    let text = ini.to_string();
    assert_eq!(
        text,
        "[Window]\nwidth = 800\n; pixels too\nheight = 600\n\n; switches\n[Flags]\nverbose\n"
    );
    assert!(matches!(
        ini.comment("Window", "width"),
        Err(IniError::NoComment { .. })
    ));
    assert!(matches!(
        ini.set_comment("Window", "depth", "x"),
        Err(IniError::NoSuchOption { .. })
    ));
}

#[test]
fn strict_reader_rejects_duplicates() {
    let mut ini = CommentedIni::new();
    let err = ini.read_str("[A]\nx = 1\nx = 2\n").unwrap_err();
    assert!(matches!(err, IniError::DuplicateOption { line: Some(3), .. }));
}
