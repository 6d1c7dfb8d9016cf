use std::ops::{Deref, Index};

use super::kline_unit::KLineUnit;
use crate::common::boll_exception::{BollException, BollResult, ErrCode};

/// Ordered bar sequence as delivered by a data source.
///
/// Appends must keep timestamps non-decreasing; the calculator itself never
/// checks ordering, so this is the place where feeds get validated.
#[derive(Debug, Clone, Default)]
pub struct KLineList {
    pub lst: Vec<KLineUnit>,
}

impl KLineList {
    pub fn new() -> Self {
        Self { lst: Vec::new() }
    }

    /// Sort unordered bars by timestamp and wrap them
    pub fn from_unsorted(mut klus: Vec<KLineUnit>) -> Self {
        klus.sort_by_key(|k| k.timestamp);
        Self { lst: klus }
    }

    /// Add a single KLineUnit to the list
    pub fn add_single_klu(&mut self, klu: KLineUnit) -> BollResult<()> {
        if let Some(last) = self.lst.last() {
            if klu.timestamp < last.timestamp {
                return Err(BollException::new(
                    format!(
                        "kline time err, cur={}, last={}",
                        klu.timestamp, last.timestamp
                    ),
                    ErrCode::KlNotMonotonous,
                ));
            }
        }
        self.lst.push(klu);
        Ok(())
    }

    pub fn last(&self) -> Option<&KLineUnit> {
        self.lst.last()
    }

    pub fn len(&self) -> usize {
        self.lst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lst.is_empty()
    }

    pub fn as_slice(&self) -> &[KLineUnit] {
        &self.lst
    }
}

impl Index<usize> for KLineList {
    type Output = KLineUnit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.lst[index]
    }
}

impl Deref for KLineList {
    type Target = [KLineUnit];

    fn deref(&self) -> &Self::Target {
        &self.lst
    }
}

impl TryFrom<Vec<KLineUnit>> for KLineList {
    type Error = BollException;

    fn try_from(klus: Vec<KLineUnit>) -> Result<Self, Self::Error> {
        let mut list = Self::new();
        for klu in klus {
            list.add_single_klu(klu)?;
        }
        Ok(list)
    }
}
