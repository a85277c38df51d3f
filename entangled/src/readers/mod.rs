//! Readers for parsing markdown and annotated code.

mod code;
mod delimiters;
mod markdown;
mod types;
mod yaml_header;

pub use code::{read_annotated_code, read_annotated_file, read_top_level_blocks, AnnotatedBlock};
pub use delimiters::{extract_all_tokens, DelimitedToken, DelimitedTokenGetter, ExtractResult};
pub use markdown::{parse_markdown, parse_markdown_with_hooks, read_markdown_file, ParsedDocument};
pub use types::InputToken;
pub use yaml_header::{extract_yaml_header, parse_simple_yaml, split_yaml_header, YamlHeader};
