use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::program::ShaderError;

const MARKER: &str = "#shader";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Section {
    Vertex,
    Fragment,
}

/// Vertex and fragment sources split out of one combined file.
///
/// A line containing `#shader` selects the section the following lines go
/// to: `vertex` or `fragment` has to appear on the same line. Lines before
/// the first marker belong to no section and are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderProgramSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgramSource {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ShaderError::Io(path.to_owned(), e))?;

        Self::parse(BufReader::new(file)).map_err(|e| ShaderError::Io(path.to_owned(), e))
    }

    pub fn parse(reader: impl BufRead) -> std::io::Result<Self> {
        let mut source = Self::default();
        let mut section = None;

        for line in reader.lines() {
            let line = line?;

            if line.contains(MARKER) {
                if line.contains("vertex") {
                    section = Some(Section::Vertex);
                } else if line.contains("fragment") {
                    section = Some(Section::Fragment);
                }
                continue;
            }

            let target = match section {
                Some(Section::Vertex) => &mut source.vertex,
                Some(Section::Fragment) => &mut source.fragment,
                None => continue,
            };
            target.push_str(&line);
            target.push('\n');
        }

        Ok(source)
    }
}

impl FromStr for ShaderProgramSource {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn splits_sections() {
        let src: ShaderProgramSource = "#shader vertex\na\nb\n#shader fragment\nc\nd\n"
            .parse()
            .unwrap();

        assert_eq!(src.vertex, "a\nb\n");
        assert_eq!(src.fragment, "c\nd\n");
    }

    #[test]
    fn preamble_is_dropped() {
        let src: ShaderProgramSource = "// header\n\n#shader fragment\nc\n#shader vertex\na"
            .parse()
            .unwrap();

        assert_eq!(src.vertex, "a\n");
        assert_eq!(src.fragment, "c\n");
    }

    #[test]
    fn sections_accumulate() {
        let src: ShaderProgramSource =
            "#shader vertex\na\n#shader fragment\nb\n#shader vertex\nc\n"
                .parse()
                .unwrap();

        assert_eq!(src.vertex, "a\nc\n");
        assert_eq!(src.fragment, "b\n");
    }

    #[test]
    fn unknown_marker_keeps_section() {
        let src: ShaderProgramSource = "#shader vertex\na\n#shader geometry\nb\n"
            .parse()
            .unwrap();

        assert_eq!(src.vertex, "a\nb\n");
        assert!(src.fragment.is_empty());
    }

    #[test]
    fn empty_input() {
        let src: ShaderProgramSource = "".parse().unwrap();

        assert_eq!(src, ShaderProgramSource::default());
    }

    #[test]
    fn parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "#shader vertex\nvoid main() {{}}\n#shader fragment\nout vec4 c;\n").unwrap();

        let src = ShaderProgramSource::parse_file(file.path()).unwrap();

        assert_eq!(src.vertex, "void main() {}\n");
        assert_eq!(src.fragment, "out vec4 c;\n");
    }

    #[test]
    fn missing_file() {
        let err = ShaderProgramSource::parse_file("does/not/exist.shader").unwrap_err();

        assert!(matches!(err, ShaderError::Io(..)));
    }
}
