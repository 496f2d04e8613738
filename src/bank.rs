//! Inventory of salvaged bars and the bookkeeping of cutting them.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::BankError;
use crate::member::{buckling_utilization, stress_utilization, Member};
use crate::sections::{SectionProperties, SectionTable};

/// Transport distances of a stock element in km.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportDistances {
    /// From the storage site to the fabrication workshop.
    pub fabrication: f64,
    /// From the workshop to the building site.
    pub building: f64,
    /// From the workshop to the recycling plant, for waste.
    pub recycling: f64,
}

impl TransportDistances {
    /// Create a set of distances.
    #[must_use]
    pub const fn new(fabrication: f64, building: f64, recycling: f64) -> Self {
        Self {
            fabrication,
            building,
            recycling,
        }
    }
}

/// One bar of salvaged material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockElement {
    /// Profile name in the section table.
    profile: String,
    /// Current length in mm.
    length: f64,
    /// Transport distances of the bar.
    distances: TransportDistances,
    /// Serving a member.
    in_use: bool,
    /// Left over from an earlier cut rather than delivered as stock.
    #[serde(default)]
    offcut: bool,
}

impl StockElement {
    /// Create an unused stock element.
    #[must_use]
    pub fn new(profile: impl Into<String>, length: f64, distances: TransportDistances) -> Self {
        Self {
            profile: profile.into(),
            length,
            distances,
            in_use: false,
            offcut: false,
        }
    }

    /// An unused remainder of a cut.
    fn remainder(profile: String, length: f64, distances: TransportDistances) -> Self {
        Self {
            offcut: true,
            ..Self::new(profile, length, distances)
        }
    }

    /// Profile name.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Current length in mm.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Transport distances.
    #[must_use]
    pub fn distances(&self) -> TransportDistances {
        self.distances
    }

    /// Whether the element currently serves a member.
    #[must_use]
    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Whether the element is the remainder of a cut.
    #[must_use]
    pub fn is_offcut(&self) -> bool {
        self.offcut
    }

    /// Whether the element may still be allocated. Delivered stock qualifies
    /// whenever it is unused; an off-cut must also be at least `min_length`.
    #[must_use]
    pub fn reusable(&self, min_length: f64) -> bool {
        !self.in_use && (!self.offcut || self.length >= min_length)
    }

    /// Whether the element is an unused off-cut shorter than `min_length`.
    #[must_use]
    pub fn is_waste(&self, min_length: f64) -> bool {
        !self.in_use && self.offcut && self.length < min_length
    }
}

/// Everything the objective needs to know about a piece offered to a member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Length still available on the piece in mm.
    pub length: f64,
    /// Section of the piece.
    pub section: SectionProperties,
    /// Transport distances of the piece.
    pub distances: TransportDistances,
    /// Off-cuts shorter than this are waste.
    pub min_reusable_length: f64,
}

impl Candidate {
    /// The same piece with less length left.
    #[must_use]
    pub fn with_length(self, length: f64) -> Self {
        Self { length, ..self }
    }

    /// Whether a member of `length` fits with material to spare.
    #[must_use]
    pub fn fits(&self, length: f64) -> bool {
        self.length > length
    }

    /// Whether the piece carries `axial_force` over `member`'s length.
    #[must_use]
    pub fn carries(&self, member: &Member, axial_force: f64) -> bool {
        stress_utilization(axial_force, &self.section, member.material()) < 1.0
            && buckling_utilization(axial_force, member.length(), &self.section, member.material())
                < 1.0
    }
}

/// Result of [`MaterialBank::cut`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CutOutcome {
    /// Index of the piece now serving the member.
    pub used: usize,
    /// Index of the appended off-cut, if one was kept.
    pub offcut: Option<usize>,
}

/// Orderings accepted by [`MaterialBank::sort`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Shortest first.
    LengthAscending,
    /// Longest first.
    LengthDescending,
    /// Largest cross-section first.
    AreaDescending,
    /// Alphabetical by profile, longest first within a profile.
    Profile,
}

/// Ordered collection of stock elements.
///
/// Indices are stable: cuts modify the element in place and append off-cuts at
/// the end. Only [`MaterialBank::sort`] reorders the collection. Off-cuts below
/// the minimum reusable length stay in the bank for mass accounting but are
/// never offered as candidates.
#[derive(Clone, Debug)]
pub struct MaterialBank {
    /// Elements in index order.
    stock: Vec<StockElement>,
    /// Catalogue the profiles are looked up in.
    sections: Arc<SectionTable>,
    /// Off-cuts shorter than this in mm are waste.
    min_reusable_length: f64,
}

impl MaterialBank {
    /// Default minimum length in mm for a piece to count as reusable.
    pub const DEFAULT_MIN_REUSABLE_LENGTH: f64 = 300.0;

    /// Create an empty bank.
    #[must_use]
    pub fn new(sections: Arc<SectionTable>, min_reusable_length: f64) -> Self {
        Self {
            stock: Vec::new(),
            sections,
            min_reusable_length,
        }
    }

    /// Build a bank from parallel lists, `quantities[i]` copies of
    /// `profiles[i]` at `lengths[i]` all sharing `distances`.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::MismatchedLists`] when the lists differ in length and
    /// any error of [`MaterialBank::push`].
    pub fn from_lists(
        sections: Arc<SectionTable>,
        min_reusable_length: f64,
        profiles: &[String],
        quantities: &[usize],
        lengths: &[f64],
        distances: TransportDistances,
    ) -> Result<Self, BankError> {
        if profiles.len() != quantities.len() || profiles.len() != lengths.len() {
            return Err(BankError::MismatchedLists {
                profiles: profiles.len(),
                quantities: quantities.len(),
                lengths: lengths.len(),
            });
        }
        let mut bank = Self::new(sections, min_reusable_length);
        for ((profile, quantity), length) in profiles.iter().zip(quantities).zip(lengths) {
            for _ in 0..*quantity {
                bank.push(StockElement::new(profile.clone(), *length, distances))?;
            }
        }
        Ok(bank)
    }

    /// Build a bank from compact `<quantity>x<profile>x<length>` commands.
    ///
    /// The quantity is the text before the first `x` and the length the text
    /// after the last one, so profile names may contain `x` themselves.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::InvalidCommand`] for malformed commands and any error
    /// of [`MaterialBank::push`].
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use trussreuse::{MaterialBank, SectionTable, TransportDistances};
    ///
    /// let bank = MaterialBank::from_commands(
    ///     Arc::new(SectionTable::builtin()),
    ///     300.0,
    ///     &["2xIPE200x1500", "1xHEA100x4000"],
    ///     TransportDistances::default(),
    /// )?;
    /// assert_eq!(bank.len(), 3);
    /// # Ok::<(), trussreuse::BankError>(())
    /// ```
    pub fn from_commands<S: AsRef<str>>(
        sections: Arc<SectionTable>,
        min_reusable_length: f64,
        commands: &[S],
        distances: TransportDistances,
    ) -> Result<Self, BankError> {
        let mut bank = Self::new(sections, min_reusable_length);
        for command in commands {
            let (quantity, profile, length) = parse_command(command.as_ref())?;
            for _ in 0..quantity {
                bank.push(StockElement::new(profile.clone(), length, distances))?;
            }
        }
        Ok(bank)
    }

    /// Append a stock element and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::NegativeLength`] for negative or non-finite lengths
    /// and [`BankError::UnknownProfile`] for profiles missing from the table.
    pub fn push(&mut self, element: StockElement) -> Result<usize, BankError> {
        if element.length < 0.0 || !element.length.is_finite() {
            return Err(BankError::NegativeLength(element.length));
        }
        if self.sections.get(&element.profile).is_none() {
            return Err(BankError::UnknownProfile(element.profile));
        }
        self.stock.push(element);
        Ok(self.stock.len() - 1)
    }

    /// Number of elements, including used pieces and waste.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stock.len()
    }

    /// Whether the bank holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }

    /// Element by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StockElement> {
        self.stock.get(index)
    }

    /// All elements in bank order.
    pub fn iter(&self) -> impl Iterator<Item = &StockElement> {
        self.stock.iter()
    }

    /// Minimum length in mm for a piece to be offered.
    #[must_use]
    pub fn min_reusable_length(&self) -> f64 {
        self.min_reusable_length
    }

    /// Shared section catalogue.
    #[must_use]
    pub fn sections(&self) -> &Arc<SectionTable> {
        &self.sections
    }

    /// Section of the element at `index`.
    #[must_use]
    pub fn section_of(&self, index: usize) -> Option<SectionProperties> {
        self.stock
            .get(index)
            .and_then(|element| self.sections.get(&element.profile).copied())
    }

    /// The element at `index` described as a candidate for the objective.
    #[must_use]
    pub fn candidate(&self, index: usize) -> Option<Candidate> {
        let element = self.stock.get(index)?;
        Some(Candidate {
            length: element.length,
            section: self.section_of(index)?,
            distances: element.distances,
            min_reusable_length: self.min_reusable_length,
        })
    }

    /// Elements that may still be allocated, with their indices.
    pub fn available(&self) -> impl Iterator<Item = (usize, &StockElement)> {
        let min = self.min_reusable_length;
        self.stock
            .iter()
            .enumerate()
            .filter(move |(_, element)| element.reusable(min))
    }

    /// Unused off-cuts too short to be offered again.
    pub fn waste(&self) -> impl Iterator<Item = (usize, &StockElement)> {
        let min = self.min_reusable_length;
        self.stock
            .iter()
            .enumerate()
            .filter(move |(_, element)| element.is_waste(min))
    }

    /// Mass of every element in kg for a density in kg/mm³.
    #[must_use]
    pub fn total_mass(&self, density: f64) -> f64 {
        (0..self.stock.len())
            .map(|index| self.mass_of(index, density))
            .sum()
    }

    /// Mass of the elements that may still be allocated.
    #[must_use]
    pub fn available_mass(&self, density: f64) -> f64 {
        self.available()
            .map(|(index, _)| self.mass_of(index, density))
            .sum()
    }

    fn mass_of(&self, index: usize, density: f64) -> f64 {
        match (self.stock.get(index), self.section_of(index)) {
            (Some(element), Some(section)) => element.length * section.area * density,
            _ => 0.0,
        }
    }

    /// Stock able to supply `member` under `axial_force`.
    ///
    /// A candidate is reusable, strictly longer than the member, and keeps both
    /// yield and buckling utilisation below one when the force acts on the
    /// stock section. The list is ordered by yield utilisation ascending, then
    /// by length descending, then by index.
    #[must_use]
    pub fn find_feasible(&self, member: &Member, axial_force: f64) -> Vec<usize> {
        let mut ranked: Vec<(usize, f64, f64)> = self
            .available()
            .filter_map(|(index, _)| {
                let candidate = self.candidate(index)?;
                (candidate.fits(member.length()) && candidate.carries(member, axial_force)).then(
                    || {
                        let utilization =
                            stress_utilization(axial_force, &candidate.section, member.material());
                        (index, utilization, candidate.length)
                    },
                )
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| b.2.total_cmp(&a.2))
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.into_iter().map(|(index, _, _)| index).collect()
    }

    /// Cut `length` from the element at `index`.
    ///
    /// With `keep_offcut` the element becomes the used piece and the remainder
    /// is appended as a new unused element (nothing is appended for an exact
    /// fit). Without it the whole element is marked in use.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::UnknownStock`], [`BankError::AlreadyInUse`],
    /// [`BankError::NegativeLength`] or [`BankError::InsufficientLength`].
    pub fn cut(
        &mut self,
        index: usize,
        length: f64,
        keep_offcut: bool,
    ) -> Result<CutOutcome, BankError> {
        if length < 0.0 || !length.is_finite() {
            return Err(BankError::NegativeLength(length));
        }
        let element = self
            .stock
            .get_mut(index)
            .ok_or(BankError::UnknownStock(index))?;
        if element.in_use {
            return Err(BankError::AlreadyInUse(index));
        }
        if element.length < length {
            return Err(BankError::InsufficientLength {
                stock: index,
                available: element.length,
                requested: length,
            });
        }
        element.in_use = true;
        if !keep_offcut {
            return Ok(CutOutcome {
                used: index,
                offcut: None,
            });
        }
        let remainder = element.length - length;
        element.length = length;
        if remainder <= 0.0 {
            return Ok(CutOutcome {
                used: index,
                offcut: None,
            });
        }
        let offcut = StockElement::remainder(element.profile.clone(), remainder, element.distances);
        self.stock.push(offcut);
        log::debug!(
            "cut {length:.1} mm from stock {index}, off-cut of {remainder:.1} mm kept as {}",
            self.stock.len() - 1
        );
        Ok(CutOutcome {
            used: index,
            offcut: Some(self.stock.len() - 1),
        })
    }

    /// Reorder the bank. Indices handed out before the call become stale.
    pub fn sort(&mut self, order: SortOrder) {
        let sections = Arc::clone(&self.sections);
        let area = |element: &StockElement| {
            sections
                .get(&element.profile)
                .map_or(0.0, |section| section.area)
        };
        match order {
            SortOrder::LengthAscending => {
                self.stock.sort_by(|a, b| a.length.total_cmp(&b.length));
            }
            SortOrder::LengthDescending => {
                self.stock.sort_by(|a, b| b.length.total_cmp(&a.length));
            }
            SortOrder::AreaDescending => {
                self.stock.sort_by(|a, b| area(b).total_cmp(&area(a)));
            }
            SortOrder::Profile => self.stock.sort_by(|a, b| match a.profile.cmp(&b.profile) {
                Ordering::Equal => b.length.total_cmp(&a.length),
                other => other,
            }),
        }
    }
}

fn parse_command(command: &str) -> Result<(usize, String, f64), BankError> {
    let invalid = |reason: &str| BankError::InvalidCommand {
        command: command.to_string(),
        reason: reason.to_string(),
    };
    let trimmed = command.trim();
    let (quantity, rest) = trimmed
        .split_once('x')
        .ok_or_else(|| invalid("expected <quantity>x<profile>x<length>"))?;
    let (profile, length) = rest
        .rsplit_once('x')
        .ok_or_else(|| invalid("expected <quantity>x<profile>x<length>"))?;
    let quantity = quantity
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid("quantity is not a whole number"))?;
    let length = length
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid("length is not a number"))?;
    let profile = profile.trim();
    if profile.is_empty() {
        return Err(invalid("profile name is empty"));
    }
    Ok((quantity, profile.to_string(), length))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;
    use crate::member::MemberSpec;

    fn sections() -> Arc<SectionTable> {
        let mut table = SectionTable::builtin();
        table.insert(
            "RHS100x50x5",
            SectionProperties::new(1360.0, 1.67e6, 0.563e6, 1.42e6),
        );
        Arc::new(table)
    }

    fn member(length: f64) -> Member {
        let spec = MemberSpec::new(point(0.0, 0.0, 0.0), point(length, 0.0, 0.0), "IPE200");
        Member::new(&spec, sections().lookup("IPE200").expect("builtin profile"))
    }

    fn bank(commands: &[&str]) -> MaterialBank {
        MaterialBank::from_commands(sections(), 300.0, commands, TransportDistances::default())
            .expect("commands are valid")
    }

    #[test]
    fn commands_accept_profiles_containing_x() {
        let bank = bank(&["2xRHS100x50x5x2500"]);
        assert_eq!(bank.len(), 2);
        let element = bank.get(1).expect("second copy exists");
        assert_eq!(element.profile(), "RHS100x50x5");
        assert_relative_eq!(element.length(), 2_500.0);
    }

    #[test]
    fn malformed_commands_are_rejected() {
        for command in ["IPE200", "twoxIPE200x100", "1xIPE200xlong", "1xx100"] {
            let error = MaterialBank::from_commands(
                sections(),
                300.0,
                &[command],
                TransportDistances::default(),
            )
            .expect_err("malformed command rejected");
            assert!(
                matches!(error, BankError::InvalidCommand { .. }),
                "{command}: {error:?}"
            );
        }
    }

    #[test]
    fn parallel_lists_must_match() {
        let error = MaterialBank::from_lists(
            sections(),
            300.0,
            &["IPE200".to_string()],
            &[1, 2],
            &[1_000.0],
            TransportDistances::default(),
        )
        .expect_err("mismatched lists rejected");
        assert_eq!(
            error,
            BankError::MismatchedLists {
                profiles: 1,
                quantities: 2,
                lengths: 1
            }
        );
    }

    #[test]
    fn push_validates_profile_and_length() {
        let mut bank = bank(&[]);
        assert_eq!(
            bank.push(StockElement::new("UPN80", 100.0, TransportDistances::default())),
            Err(BankError::UnknownProfile("UPN80".to_string()))
        );
        assert_eq!(
            bank.push(StockElement::new("IPE200", -1.0, TransportDistances::default())),
            Err(BankError::NegativeLength(-1.0))
        );
    }

    #[test]
    fn feasible_candidates_are_ranked() {
        let bank = bank(&["1xIPE200x1500", "1xHEA200x1200", "1xIPE200x3000", "1xIPE80x1100"]);
        let candidates = bank.find_feasible(&member(1_000.0), -50_000.0);
        // HEA200 is least utilised; the two IPE200 tie and the longer one wins.
        assert_eq!(candidates, vec![1, 2, 0, 3]);
    }

    #[test]
    fn overloaded_stock_is_not_feasible() {
        let bank = bank(&["1xIPE80x2000", "1xIPE200x2000"]);
        let force = 764.0 * 355.0 * 1.01;
        assert_eq!(bank.find_feasible(&member(1_000.0), force), vec![1]);
    }

    #[test]
    fn cut_without_offcut_consumes_the_piece() {
        let mut bank = bank(&["1xIPE200x1500"]);
        let outcome = bank.cut(0, 1_000.0, false).expect("piece is free");
        assert_eq!(outcome, CutOutcome { used: 0, offcut: None });
        assert_eq!(bank.len(), 1);
        assert!(bank.get(0).is_some_and(StockElement::in_use));
        assert_relative_eq!(bank.get(0).map_or(0.0, StockElement::length), 1_500.0);
    }

    #[test]
    fn cut_validates_its_input() {
        let mut bank = bank(&["1xIPE200x1500"]);
        assert_eq!(bank.cut(3, 100.0, true), Err(BankError::UnknownStock(3)));
        assert_eq!(bank.cut(0, -5.0, true), Err(BankError::NegativeLength(-5.0)));
        assert!(matches!(
            bank.cut(0, 2_000.0, true),
            Err(BankError::InsufficientLength { stock: 0, .. })
        ));
    }

    #[test]
    fn short_offcuts_become_waste() {
        let mut bank = bank(&["1xIPE200x1200"]);
        let outcome = bank.cut(0, 1_000.0, true).expect("piece is free");
        let offcut = outcome.offcut.expect("remainder kept");
        assert_eq!(bank.available().count(), 0);
        assert_eq!(bank.waste().map(|(index, _)| index).collect::<Vec<_>>(), vec![offcut]);
        assert!(bank.find_feasible(&member(100.0), 0.0).is_empty());
    }

    #[test]
    fn short_delivered_stock_is_still_offered() {
        let mut bank = bank(&["1xIPE200x280"]);
        assert!(!bank.get(0).is_some_and(StockElement::is_offcut));
        assert_eq!(bank.available().count(), 1);
        assert_eq!(bank.waste().count(), 0);
        assert_eq!(bank.find_feasible(&member(250.0), 0.0), vec![0]);

        let outcome = bank.cut(0, 250.0, true).expect("piece is free");
        let offcut = outcome.offcut.expect("remainder kept");
        assert!(bank.get(offcut).is_some_and(StockElement::is_offcut));
        assert_eq!(bank.waste().map(|(index, _)| index).collect::<Vec<_>>(), vec![offcut]);
    }

    #[test]
    fn sorting_orders_elements() {
        let mut bank = bank(&["1xIPE200x1500", "1xHEA200x1200", "1xIPE80x3000"]);
        bank.sort(SortOrder::LengthAscending);
        let lengths: Vec<f64> = bank.iter().map(StockElement::length).collect();
        assert_eq!(lengths, vec![1_200.0, 1_500.0, 3_000.0]);
        bank.sort(SortOrder::AreaDescending);
        assert_eq!(bank.get(0).map(StockElement::profile), Some("HEA200"));
        bank.sort(SortOrder::Profile);
        let profiles: Vec<&str> = bank.iter().map(StockElement::profile).collect();
        assert_eq!(profiles, vec!["HEA200", "IPE200", "IPE80"]);
    }

    #[test]
    fn masses_follow_sections() {
        let bank = bank(&["1xIPE200x1000"]);
        assert_relative_eq!(bank.total_mass(1.0), 2_848_000.0);
        assert_relative_eq!(bank.available_mass(1.0), bank.total_mass(1.0));
    }
}
