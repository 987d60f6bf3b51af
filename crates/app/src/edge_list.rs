use anyhow::{bail, Result};
use grid_layout::GraphBuilder;

/// Parse a plain edge list into a graph builder
///
/// Every non-empty line holds either a single vertex name or a
/// `predecessor successor` pair, optionally written `predecessor -> successor`.
/// Text after `#` is ignored. Vertices are added in order of first
/// appearance.
pub fn parse(input: &str) -> Result<GraphBuilder<String>> {
    let mut builder = GraphBuilder::new();

    for (number, line) in input.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        let names: Vec<&str> = line
            .split_whitespace()
            .filter(|token| *token != "->")
            .collect();

        match names[..] {
            [] => {}
            [vertex] => {
                builder.add_vertex(vertex.to_string());
            }
            [source, target] => {
                let (source, target) = (source.to_string(), target.to_string());
                builder
                    .add_vertex(source.clone())
                    .add_vertex(target.clone())
                    .add_edge(&source, &target)?;
            }
            _ => bail!("line {}: expected one or two vertex names", number + 1),
        }
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_parse_edges_and_vertices() {
        let builder = parse("start save\nsave -> ende # comment\n\nlonely\n").unwrap();
        let graph = builder.prepare().unwrap();
        assert_eq!(graph.payloads(), &["start", "save", "ende", "lonely"]);
        assert_eq!(graph.grid().edge_count(), 2);
    }

    #[test]
    fn test_parse_rejects_long_lines() {
        let err = parse("a b\na b c\n").err().unwrap();
        assert_eq!(err.to_string(), "line 2: expected one or two vertex names");
    }
}
