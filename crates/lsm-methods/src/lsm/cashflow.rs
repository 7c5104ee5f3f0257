//! Intrinsic values of the put on every observation date.

use lsm_core::{errors::Error, Real, Result, Size};
use rayon::prelude::*;

use crate::monte_carlo::PathEnsemble;

/// Put payoff `max(0, K − S)`.
#[inline]
pub fn put_payoff(strike: Real, spot: Real) -> Real {
    (strike - spot).max(0.0)
}

/// `max(0, K − Sᵢ)` for every date `i = 0 ..= m` and every path.
#[derive(Debug, Clone)]
pub struct CashflowTable {
    strike: Real,
    flows: Vec<Vec<Real>>,
}

impl CashflowTable {
    /// Evaluate the put payoff across the whole ensemble.
    pub fn new(ensemble: &PathEnsemble, strike: Real) -> Self {
        let flows = (0..=ensemble.steps())
            .map(|i| {
                ensemble
                    .cross_section(i)
                    .par_iter()
                    .map(|&s| put_payoff(strike, s))
                    .collect()
            })
            .collect();
        Self { strike, flows }
    }

    /// Strike `K`.
    pub fn strike(&self) -> Real {
        self.strike
    }

    /// Number of dates (`m + 1`).
    pub fn dates(&self) -> Size {
        self.flows.len()
    }

    /// Cashflows of every path at `step`.
    pub fn at(&self, step: Size) -> &[Real] {
        &self.flows[step]
    }

    /// Reverse-mode adjoint of the payoff.
    ///
    /// Where the put is in the money, `∂C/∂K = 1` and `∂C/∂S = −1`; out of
    /// the money (and at the kink) both partials are taken as zero.  The
    /// spot adjoints are accumulated into `spot_bar`; the strike adjoint is
    /// returned.
    pub fn adjoint(&self, cashflow_bar: &[Vec<Real>], spot_bar: &mut [Vec<Real>]) -> Result<Real> {
        if cashflow_bar.len() != self.flows.len() || spot_bar.len() != self.flows.len() {
            return Err(Error::InvalidArgument(format!(
                "cashflow adjoint expects {} dates",
                self.flows.len()
            )));
        }
        let mut strike_bar = 0.0;
        for ((flows, c_bar), s_bar) in self.flows.iter().zip(cashflow_bar).zip(spot_bar.iter_mut()) {
            for ((s_bar, &c), &c_bar) in s_bar.iter_mut().zip(flows).zip(c_bar) {
                if c > 0.0 {
                    *s_bar -= c_bar;
                    strike_bar += c_bar;
                }
            }
        }
        Ok(strike_bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::PathSimulator;
    use lsm_processes::GeometricBrownianMotionProcess;

    fn ensemble() -> PathEnsemble {
        let process = GeometricBrownianMotionProcess::new(40.0, 0.06, 0.2).unwrap();
        PathSimulator::new(process, 1.0, 4, 32)
            .unwrap()
            .simulate_seeded(3)
    }

    #[test]
    fn payoff_is_non_negative_intrinsic() {
        assert_eq!(put_payoff(40.0, 36.0), 4.0);
        assert_eq!(put_payoff(40.0, 44.0), 0.0);
        let ens = ensemble();
        let table = CashflowTable::new(&ens, 40.0);
        assert_eq!(table.dates(), 5);
        for i in 0..table.dates() {
            for (&c, &s) in table.at(i).iter().zip(ens.cross_section(i)) {
                assert!(c >= 0.0);
                assert_eq!(c, (40.0 - s).max(0.0));
            }
        }
    }

    #[test]
    fn adjoint_routes_only_in_the_money_entries() {
        let ens = ensemble();
        let table = CashflowTable::new(&ens, 40.0);
        let bar = vec![vec![1.0; 32]; 5];
        let mut spot_bar = vec![vec![0.0; 32]; 5];
        let k_bar = table.adjoint(&bar, &mut spot_bar).unwrap();

        let itm = (0..5)
            .flat_map(|i| table.at(i).iter())
            .filter(|&&c| c > 0.0)
            .count();
        assert_eq!(k_bar, itm as Real);
        for i in 0..5 {
            for (&sb, &c) in spot_bar[i].iter().zip(table.at(i)) {
                assert_eq!(sb, if c > 0.0 { -1.0 } else { 0.0 });
            }
        }
    }
}
