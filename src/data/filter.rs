use super::model::TradeDataset;

/// Return indices of records whose year equals `year`, in source order.
///
/// A year that does not occur in the dataset simply yields no indices.
pub fn rows_for_year(dataset: &TradeDataset, year: i32) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| rec.year == year)
        .map(|(i, _)| i)
        .collect()
}

/// `(min, max)` year for the slider, or `None` for an empty dataset.
pub fn year_range(dataset: &TradeDataset) -> Option<(i32, i32)> {
    Some((*dataset.years.first()?, *dataset.years.last()?))
}

/// The slider starts on the latest year.
pub fn default_year(dataset: &TradeDataset) -> Option<i32> {
    dataset.years.last().copied()
}
