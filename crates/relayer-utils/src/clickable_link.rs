// Copyright 2024 Pell Network Developers.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;

/// A terminal hyperlink (OSC 8), used to print transaction hashes that open in
/// the block explorer.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ClickableLink<'a> {
    text: &'a str,
    url: &'a str,
}

impl<'a> ClickableLink<'a> {
    /// Create a new link with a name and target URL.
    pub fn new(text: &'a str, url: &'a str) -> Self {
        Self { text, url }
    }
}

impl fmt::Display for ClickableLink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\u{1b}]8;;{}\u{1b}\\{}\u{1b}]8;;\u{1b}\\",
            self.url, self.text
        )
    }
}

/// Renders `text` as a link to `{explorer}/tx/{text}`, or as plain text when
/// no explorer is known for the chain.
pub fn tx_link(explorer: Option<&url::Url>, text: &str) -> String {
    match explorer.and_then(|base| base.join(&format!("tx/{text}")).ok()) {
        Some(url) => ClickableLink::new(text, url.as_str()).to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_to_the_explorer_tx_page() {
        let explorer = url::Url::parse("https://scan.pell.network/").unwrap();
        let link = tx_link(Some(&explorer), "0xabc");
        assert!(link.contains("https://scan.pell.network/tx/0xabc"));
        assert_eq!(tx_link(None, "0xabc"), "0xabc");
    }
}
