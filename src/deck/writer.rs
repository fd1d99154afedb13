use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::config::EngineConfig;
use crate::consistency::ValidateObjectSurfaceMap;
use crate::error::{ConsistencyError, DeckError, RegistryError, Result};
use crate::model::Model;
use crate::registry::{CellData, CellId, CellState};

use super::card::{density, number, to_card};

/// Indent that marks a continuation line.
pub const CONTINUATION: &str = "     ";

/// Serializes a finished model as cell cards, a blank line, then surface
/// cards.
///
/// The whole deck is rendered and validated in memory before anything is
/// written, so a failed build never emits a partial deck.
#[derive(Debug, Clone)]
pub struct DeckWriter {
    line_width: usize,
}

impl DeckWriter {
    /// Creates a writer using the configured line width.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_line_width(config.line_width)
    }

    /// Creates a writer that continues cards past `line_width` columns.
    #[must_use]
    pub fn with_line_width(line_width: usize) -> Self {
        Self { line_width }
    }

    /// Renders the deck without changing the model.
    ///
    /// # Errors
    ///
    /// Returns an error if any cell has not reached complement resolution,
    /// still holds a placeholder, or references a missing surface.
    pub fn render(&self, model: &Model) -> Result<String> {
        for (id, cell) in model.objects().iter() {
            let state = cell.state();
            if state != CellState::Finalized && !state.can_advance_to(CellState::Finalized) {
                return Err(RegistryError::InvalidTransition {
                    cell: id,
                    from: state,
                    to: CellState::Finalized,
                }
                .into());
            }
            if let Some(target) = cell.region().cell_complements().into_iter().next() {
                return Err(ConsistencyError::UnresolvedComplement { cell: id, target }.into());
            }
        }
        ValidateObjectSurfaceMap::new().execute(model)?;

        let mut out = String::new();
        for (id, cell) in model.objects().iter() {
            self.push_card(&mut out, cell_tokens(id, cell));
        }
        out.push('\n');
        for (id, surface) in model.surfaces().iter() {
            let card = to_card(surface);
            let mut tokens = vec![id.to_string(), card.mnemonic];
            tokens.extend(card.params.into_iter().map(number));
            self.push_card(&mut out, tokens);
        }
        Ok(out)
    }

    /// Renders the deck, writes it to `out` and marks every cell finalized.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails, in which case nothing is
    /// written, or if writing fails.
    pub fn write(&self, model: &mut Model, out: &mut impl Write) -> Result<()> {
        let deck = self.render(model)?;
        out.write_all(deck.as_bytes()).map_err(DeckError::Io)?;
        out.flush().map_err(DeckError::Io)?;
        finalize(model, deck.len())
    }

    /// Renders the deck and writes it to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails, in which case the file is not
    /// created, or if writing fails.
    pub fn write_file(&self, model: &mut Model, path: impl AsRef<Path>) -> Result<()> {
        let deck = self.render(model)?;
        std::fs::write(path.as_ref(), &deck).map_err(DeckError::Io)?;
        finalize(model, deck.len())
    }

    /// Appends one card, breaking onto continuation lines before a token
    /// would cross the line width.
    fn push_card(&self, out: &mut String, tokens: impl IntoIterator<Item = String>) {
        let mut column = 0;
        for token in tokens {
            if column == 0 {
                out.push_str(&token);
                column = token.len();
            } else if column > CONTINUATION.len() && column + 1 + token.len() > self.line_width {
                out.push('\n');
                out.push_str(CONTINUATION);
                out.push_str(&token);
                column = CONTINUATION.len() + token.len();
            } else {
                out.push(' ');
                out.push_str(&token);
                column += 1 + token.len();
            }
        }
        out.push('\n');
    }
}

fn cell_tokens(id: CellId, cell: &CellData) -> Vec<String> {
    let mut tokens = vec![id.to_string(), cell.material().to_string()];
    tokens.push(density(cell.density()));
    tokens.extend(cell.region().as_str().split_whitespace().map(str::to_owned));
    if cell.temperature().abs() > 0.0 {
        tokens.push(format!("tmp={}", number(cell.temperature())));
    }
    tokens
}

fn finalize(model: &mut Model, bytes: usize) -> Result<()> {
    let pending: Vec<CellId> = model
        .objects()
        .iter()
        .filter(|(_, cell)| cell.state() != CellState::Finalized)
        .map(|(id, _)| id)
        .collect();
    for id in pending {
        model.advance(id, CellState::Finalized)?;
    }
    info!(
        cells = model.objects().len(),
        surfaces = model.surfaces().len(),
        bytes,
        "wrote deck"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::consistency::RemoveComplements;
    use crate::geometry::{Cylinder, Plane, Sphere};
    use crate::math::{Point3, Vector3};
    use crate::rule::HeadRule;

    fn id(n: u32) -> CellId {
        CellId::new(n).unwrap()
    }

    fn sample() -> Model {
        let mut model = Model::default();
        model.intern_surface(Plane::new(Vector3::x(), 1.0).unwrap()).unwrap();
        model.intern_surface(Sphere::new(Point3::origin(), 2.0).unwrap()).unwrap();
        model
            .intern_surface(Cylinder::new(Point3::new(1.0, 2.0, 0.0), Vector3::z(), 0.5).unwrap())
            .unwrap();
        model
            .intern_surface(Plane::new(-Vector3::x(), 3.0).unwrap())
            .unwrap();
        model
            .add_cell(id(1), CellData::void(HeadRule::parse("-2").unwrap()))
            .unwrap();
        model
            .add_cell(
                id(2),
                CellData::new(3, -2.7)
                    .with_region(HeadRule::parse("2 -1 : 3 4").unwrap())
                    .with_temperature(2.5e-8),
            )
            .unwrap();
        model
    }

    #[test]
    fn deck_layout() {
        let mut model = sample();
        RemoveComplements::new().execute(&mut model).unwrap();
        let deck = DeckWriter::new(model.config()).render(&model).unwrap();
        assert_eq!(
            deck,
            "1 0 0.0 -2\n\
             2 3 -2.7 2 -1 : 3 4 tmp=0.000000025\n\
             \n\
             1 px 1\n\
             2 so 2\n\
             3 c/z 1 2 0.5\n\
             4 p -1 0 0 3\n"
        );
    }

    #[test]
    fn void_cells_keep_the_density_column() {
        let mut model = Model::default();
        model
            .intern_surface(Cylinder::new(Point3::origin(), Vector3::z(), 1.0).unwrap())
            .unwrap();
        model
            .intern_surface(Cylinder::new(Point3::origin(), Vector3::z(), 2.0).unwrap())
            .unwrap();
        model
            .add_cell(id(1), CellData::void(HeadRule::parse("1 -2").unwrap()))
            .unwrap();
        model
            .add_cell(id(2), CellData::new(4, 2.0).with_region(HeadRule::parse("-1").unwrap()))
            .unwrap();
        RemoveComplements::new().execute(&mut model).unwrap();
        let deck = DeckWriter::new(model.config()).render(&model).unwrap();
        assert_eq!(deck, "1 0 0.0 1 -2\n2 4 2.0 -1\n\n1 cz 1\n2 cz 2\n");
    }

    #[test]
    fn long_cards_continue() {
        let mut model = sample();
        RemoveComplements::new().execute(&mut model).unwrap();
        let deck = DeckWriter::with_line_width(16).render(&model).unwrap();
        for line in deck.lines() {
            assert!(line.len() <= 16 || !line.trim_start().contains(' '), "{line:?} too long");
        }
        assert!(deck.lines().any(|l| l.starts_with(CONTINUATION)));
    }

    #[test]
    fn unresolved_model_writes_nothing() {
        let mut model = sample();
        let mut out = Vec::new();
        assert!(DeckWriter::new(model.config()).write(&mut model, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn dangling_reference_writes_nothing() {
        let mut model = sample();
        model
            .add_cell(id(3), CellData::void(HeadRule::parse("9").unwrap()))
            .unwrap();
        RemoveComplements::new().execute(&mut model).unwrap();
        let mut out = Vec::new();
        let err = DeckWriter::new(model.config())
            .write(&mut model, &mut out)
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(out.is_empty());
        assert_eq!(model.cell(id(1)).unwrap().state(), CellState::ComplementsResolved);
    }

    #[test]
    fn writing_finalizes_cells() {
        let mut model = sample();
        RemoveComplements::new().execute(&mut model).unwrap();
        let mut out = Vec::new();
        let writer = DeckWriter::new(model.config());
        writer.write(&mut model, &mut out).unwrap();
        assert!(model
            .objects()
            .iter()
            .all(|(_, c)| c.state() == CellState::Finalized));
        let again = writer.render(&model).unwrap();
        assert_eq!(again.as_bytes(), out.as_slice());
    }
}
