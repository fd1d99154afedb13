use std::str::FromStr;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{DeckError, Result};
use crate::model::Model;
use crate::registry::{CellData, CellId, SurfId};
use crate::rule::HeadRule;

use super::card::from_card;
use super::writer::CONTINUATION;

/// One card with its continuation lines joined.
#[derive(Debug)]
struct Card {
    line: usize,
    tokens: Vec<String>,
}

impl Card {
    fn malformed(&self, reason: impl Into<String>) -> DeckError {
        DeckError::MalformedCard {
            line: self.line,
            reason: reason.into(),
        }
    }

    fn field<T: FromStr>(&self, index: usize, what: &str) -> std::result::Result<T, DeckError> {
        let token = self
            .tokens
            .get(index)
            .ok_or_else(|| self.malformed(format!("missing {what}")))?;
        token
            .parse()
            .map_err(|_| self.malformed(format!("invalid {what} `{token}`")))
    }
}

/// Splits text into blocks of cards separated by blank lines.
///
/// `$` starts a trailing comment and a line whose first token is `c` is a
/// comment line.
fn split_cards(text: &str) -> std::result::Result<Vec<Vec<Card>>, DeckError> {
    let mut blocks: Vec<Vec<Card>> = vec![Vec::new()];
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('$').next().unwrap_or_default();
        if content.trim().is_empty() {
            if !raw.contains('$') && blocks.last().is_some_and(|b| !b.is_empty()) {
                blocks.push(Vec::new());
            }
            continue;
        }
        let mut words = content.split_whitespace();
        if !content.starts_with(' ') && words.next().is_some_and(|w| w.eq_ignore_ascii_case("c")) {
            continue;
        }
        let tokens = content.split_whitespace().map(str::to_owned);
        let block = blocks.last_mut().ok_or(DeckError::MalformedCard {
            line,
            reason: "no card block".into(),
        })?;
        if content.starts_with(CONTINUATION) {
            let card = block.last_mut().ok_or(DeckError::MalformedCard {
                line,
                reason: "continuation line without a card".into(),
            })?;
            card.tokens.extend(tokens);
        } else {
            block.push(Card {
                line,
                tokens: tokens.collect(),
            });
        }
    }
    if blocks.last().is_some_and(Vec::is_empty) {
        blocks.pop();
    }
    Ok(blocks)
}

/// Parses a deck produced by [`DeckWriter`](super::DeckWriter) back into a
/// model.
#[derive(Debug, Clone, Default)]
pub struct DeckReader {
    config: EngineConfig,
}

impl DeckReader {
    /// Creates a reader whose models use `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Reads cell cards, a blank line, then surface cards.
    ///
    /// Blocks after the surface cards are ignored. Read cells are composed
    /// but not yet resolved.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::MalformedCard`] with the card's first line for
    /// any card that cannot be parsed, or a registry error if two surface
    /// cards share a number.
    pub fn read(&self, text: &str) -> Result<Model> {
        let mut blocks = split_cards(text)?.into_iter();
        let cell_cards = blocks.next().unwrap_or_default();
        let surface_cards = blocks.next().unwrap_or_default();
        let ignored = blocks.len();
        if ignored > 0 {
            debug!(blocks = ignored, "ignoring trailing deck blocks");
        }

        let mut model = Model::new(self.config.clone());
        for card in &surface_cards {
            let id: u32 = card.field(0, "surface number")?;
            let id = SurfId::new(id).ok_or_else(|| card.malformed("surface number must be positive"))?;
            let mnemonic = card
                .tokens
                .get(1)
                .ok_or_else(|| card.malformed("missing surface mnemonic"))?;
            let params = (2..card.tokens.len())
                .map(|i| card.field(i, "surface parameter"))
                .collect::<std::result::Result<Vec<f64>, _>>()?;
            let surface = from_card(mnemonic, &params).map_err(|reason| card.malformed(reason))?;
            model.intern_surface_numbered(id, surface)?;
        }

        let cells = cell_cards
            .iter()
            .map(parse_cell)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let count = cells.len();
        for (id, cell) in cells {
            model.add_cell(id, cell)?;
        }
        debug!(cells = count, surfaces = surface_cards.len(), "read deck");
        Ok(model)
    }
}

fn parse_cell(card: &Card) -> std::result::Result<(CellId, CellData), DeckError> {
    let id: u32 = card.field(0, "cell number")?;
    let id = CellId::new(id).ok_or_else(|| card.malformed("cell number must be positive"))?;
    let material: u32 = card.field(1, "material")?;
    let density: f64 = card.field(2, "density")?;

    let mut expression = Vec::new();
    let mut temperature = None;
    for token in &card.tokens[3..] {
        match token.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("tmp") => {
                let t = value
                    .parse::<f64>()
                    .map_err(|_| card.malformed(format!("invalid temperature `{value}`")))?;
                temperature = Some(t);
            }
            Some((key, _)) => {
                return Err(card.malformed(format!("unsupported cell parameter `{key}`")));
            }
            None if temperature.is_some() => {
                return Err(card.malformed("region token after cell parameters"));
            }
            None => expression.push(token.as_str()),
        }
    }

    let region = HeadRule::parse(&expression.join(" ")).map_err(|e| card.malformed(e.to_string()))?;
    let mut cell = CellData::new(material, density).with_region(region);
    if let Some(t) = temperature {
        cell = cell.with_temperature(t);
    }
    Ok((id, cell))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::consistency::RemoveComplements;
    use crate::deck::DeckWriter;
    use crate::error::HalfspaceError;
    use crate::geometry::SurfaceKind;
    use crate::registry::CellState;

    const DECK: &str = "\
c simple box in a sphere
1 0 0.0 -1 2 -3
     4 -5 6
2 5 -1.5 -7 #1 tmp=2.5e-8  $ shell
3 0 0.0 7

1 px 0
2 px 1
3 py 0
4 py 1
5 pz 0
6 pz 1
7 so 10
";

    fn id(n: u32) -> CellId {
        CellId::new(n).unwrap()
    }

    #[test]
    fn reads_cells_and_surfaces() {
        let model = DeckReader::default().read(DECK).unwrap();
        assert_eq!(model.objects().len(), 3);
        assert_eq!(model.surfaces().len(), 7);
        assert_eq!(model.cell_region_string(id(1)).unwrap(), "-1 2 -3 4 -5 6");
        let shell = model.cell(id(2)).unwrap();
        assert_eq!(shell.material(), 5);
        approx::assert_relative_eq!(shell.density(), -1.5);
        approx::assert_relative_eq!(shell.temperature(), 2.5e-8);
        assert_eq!(shell.state(), CellState::RegionComposed);
        assert_eq!(
            model.surfaces().get(SurfId::new(7).unwrap()).unwrap().kind(),
            SurfaceKind::Sphere
        );
    }

    #[test]
    fn written_deck_reads_back_identically() {
        let mut model = DeckReader::default().read(DECK).unwrap();
        RemoveComplements::new().execute(&mut model).unwrap();
        let writer = DeckWriter::new(model.config());
        let first = writer.render(&model).unwrap();

        let mut again = DeckReader::default().read(&first).unwrap();
        RemoveComplements::new().execute(&mut again).unwrap();
        assert_eq!(writer.render(&again).unwrap(), first);
    }

    #[test]
    fn malformed_cards_report_their_line() {
        let err = DeckReader::default()
            .read("1 0 0.0 -1\n2 0 0.0 (3\n\n1 so 1\n")
            .unwrap_err();
        assert!(matches!(
            err,
            HalfspaceError::Deck(DeckError::MalformedCard { line: 2, .. })
        ));

        let err = DeckReader::default().read("1 0 0.0 -1\n\n1 tor 1 2 3\n").unwrap_err();
        let HalfspaceError::Deck(DeckError::MalformedCard { line, reason }) = err else {
            panic!("expected a malformed card");
        };
        assert_eq!(line, 3);
        assert!(reason.contains("tor"));
    }

    #[test]
    fn void_cell_without_density_is_rejected() {
        let err = DeckReader::default().read("1 0\n\n1 so 1\n").unwrap_err();
        assert!(matches!(
            err,
            HalfspaceError::Deck(DeckError::MalformedCard { line: 1, .. })
        ));
        let model = DeckReader::default().read("1 0 0.0 -1\n\n1 so 1\n").unwrap();
        let cell = model.cell(id(1)).unwrap();
        assert!(cell.is_void());
        assert_eq!(model.cell_region_string(id(1)).unwrap(), "-1");
    }

    #[test]
    fn continuation_needs_a_card() {
        assert!(DeckReader::default().read("     1 0 0.0 -1\n").is_err());
    }

    #[test]
    fn unknown_cell_parameter_is_rejected() {
        let err = DeckReader::default().read("1 0 0.0 -1 imp:n=1\n\n1 so 1\n");
        assert!(err.is_err());
    }
}
