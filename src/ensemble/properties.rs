//! System-level properties of an ensemble.
//!
//! Occupation probabilities are evaluated with a log-sum-exp partition
//! function; every other property follows from them and from finite
//! differences of the system Helmholtz energy on the existing grid.

use super::{Ensemble, EnsembleProperty};
use crate::configuration::PropertyKind;
use crate::errors::{ZentropyError, ZentropyResult};
use crate::property::TabulatedProperty;
use crate::transform::{helmholtz_to_temperature_pressure, TransformOptions};
use crate::BOLTZMANN_CONSTANT;
use indexmap::IndexMap;
use ndarray::{Array1, ArrayD, Zip};

/// Logarithmic Boltzmann weights $\ln z_k = \ln w_k - F_k/(k_BT)$ of all
/// configurations, together with their pointwise maximum.
struct LogWeights {
    temperature: ArrayD<f64>,
    multiplicities: Vec<f64>,
    helmholtz: Vec<ArrayD<f64>>,
    ln_z: Vec<ArrayD<f64>>,
    shift: ArrayD<f64>,
}

impl Ensemble {
    fn cached<F: FnOnce() -> ZentropyResult<TabulatedProperty>>(
        &self,
        property: EnsembleProperty,
        compute: F,
    ) -> ZentropyResult<TabulatedProperty> {
        if let Some(value) = self.cache().lock().unwrap().get(property) {
            return Ok(value);
        }
        let value = compute()?;
        self.cache().lock().unwrap().insert(property, value.clone());
        Ok(value)
    }

    fn output(&self, label: &str, values: ArrayD<f64>) -> ZentropyResult<TabulatedProperty> {
        TabulatedProperty::new(
            self.variable_labels().to_vec(),
            label,
            self.grid().clone(),
            values,
        )
    }

    fn log_weights(&self) -> ZentropyResult<LogWeights> {
        let temperature = self.grid().axis_field(self.temperature_axis());
        let mut multiplicities = Vec::with_capacity(self.len());
        let mut helmholtz = Vec::with_capacity(self.len());
        let mut ln_z = Vec::with_capacity(self.len());
        for configuration in self.configurations() {
            let w = configuration.multiplicity();
            let f = configuration
                .tabulated(PropertyKind::HelmholtzEnergy)?
                .into_values();
            let mut a = ArrayD::zeros(temperature.raw_dim());
            Zip::from(&mut a)
                .and(&f)
                .and(&temperature)
                .for_each(|a, &f, &t| {
                    // T = 0 points are replaced by the ground-state limit below
                    *a = if t > 0.0 {
                        w.ln() - f / (BOLTZMANN_CONSTANT * t)
                    } else {
                        0.0
                    };
                });
            multiplicities.push(w);
            helmholtz.push(f);
            ln_z.push(a);
        }
        let mut shift = ln_z[0].clone();
        for a in &ln_z[1..] {
            Zip::from(&mut shift).and(a).for_each(|m, &a| *m = f64::max(*m, a));
        }
        Ok(LogWeights {
            temperature,
            multiplicities,
            helmholtz,
            ln_z,
            shift,
        })
    }

    /// Occupation probability field of every configuration, in insertion
    /// order.
    ///
    /// The Boltzmann weights are shifted by their pointwise maximum before
    /// exponentiation; the shift cancels in the normalization, so the result
    /// is identical to the unshifted ratio but cannot overflow. At $T = 0$
    /// the configurations of minimal Helmholtz energy share the probability
    /// in proportion to their multiplicities.
    pub fn probabilities(&self) -> ZentropyResult<IndexMap<String, TabulatedProperty>> {
        if let Some(probabilities) = self.cache().lock().unwrap().probabilities() {
            return Ok(probabilities);
        }
        let lw = self.log_weights()?;
        let mut weights: Vec<ArrayD<f64>> = lw
            .ln_z
            .iter()
            .map(|a| {
                let mut e = a - &lw.shift;
                e.mapv_inplace(f64::exp);
                e
            })
            .collect();
        let mut z = ArrayD::zeros(lw.shift.raw_dim());
        for w in &weights {
            z += w;
        }
        for w in &mut weights {
            *w /= &z;
        }
        let zero_points: Vec<_> = lw
            .temperature
            .indexed_iter()
            .filter(|(_, &t)| t == 0.0)
            .map(|(idx, _)| idx)
            .collect();
        for idx in zero_points {
            let fmin = lw
                .helmholtz
                .iter()
                .map(|f| f[&idx])
                .fold(f64::INFINITY, f64::min);
            let wsum: f64 = lw
                .helmholtz
                .iter()
                .zip(&lw.multiplicities)
                .filter(|(f, _)| f[&idx] == fmin)
                .map(|(_, &w)| w)
                .sum();
            for ((f, p), &w) in lw.helmholtz.iter().zip(&mut weights).zip(&lw.multiplicities) {
                p[&idx] = if f[&idx] == fmin { w / wsum } else { 0.0 };
            }
        }
        let mut probabilities = IndexMap::with_capacity(self.len());
        for (name, values) in self.members().keys().zip(weights) {
            probabilities.insert(name.clone(), self.output("probability", values)?);
        }
        self.cache()
            .lock()
            .unwrap()
            .insert_probabilities(probabilities.clone());
        Ok(probabilities)
    }

    /// Occupation probability of a single named configuration.
    pub fn probability(&self, name: &str) -> ZentropyResult<TabulatedProperty> {
        self.probabilities()?
            .swap_remove(name)
            .ok_or_else(|| ZentropyError::UnknownConfiguration(name.to_owned()))
    }

    /// Logarithm of the canonical partition function,
    /// $\ln Z = m + \ln\sum_k e^{\ln z_k - m}$.
    ///
    /// NaN at $T = 0$, where the partition function diverges.
    pub fn log_partition_function(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::LogPartitionFunction, || {
            let lw = self.log_weights()?;
            let mut z = ArrayD::zeros(lw.shift.raw_dim());
            for a in &lw.ln_z {
                Zip::from(&mut z).and(a).and(&lw.shift).for_each(|z, &a, &m| {
                    *z += (a - m).exp();
                });
            }
            let mut values = z;
            values.mapv_inplace(f64::ln);
            values += &lw.shift;
            Zip::from(&mut values).and(&lw.temperature).for_each(|z, &t| {
                if t == 0.0 {
                    *z = f64::NAN;
                }
            });
            self.output("log_partition_function", values)
        })
    }

    /// System Helmholtz energy:
    /// $F = \sum_k p_kF_k + k_BT\sum_k p_k\ln p_k$.
    ///
    /// The first term is the intra-configurational average, the second the
    /// inter-configurational (Gibbs) mixing term with $0\ln 0 = 0$.
    pub fn helmholtz_energy(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::HelmholtzEnergy, || {
            let probabilities = self.probabilities()?;
            let temperature = self.grid().axis_field(self.temperature_axis());
            let mut values = ArrayD::zeros(temperature.raw_dim());
            for (configuration, p) in self.configurations().zip(probabilities.values()) {
                let f = configuration.tabulated(PropertyKind::HelmholtzEnergy)?;
                Zip::from(&mut values)
                    .and(p.values())
                    .and(f.values())
                    .and(&temperature)
                    .for_each(|acc, &p, &f, &t| {
                        *acc += p * f;
                        if p > 0.0 {
                            *acc += BOLTZMANN_CONSTANT * t * p * p.ln();
                        }
                    });
            }
            self.output("helmholtz_energy", values)
        })
    }

    /// System entropy: $S = -(\partial F/\partial T)_V$.
    pub fn entropy(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::Entropy, || {
            let f = self.helmholtz_energy()?;
            let dfdt = f.partial_derivative(self.temperature_axis())?;
            Ok(dfdt.with_values("entropy", -dfdt.values()))
        })
    }

    /// Inter-configurational (Gibbs) entropy:
    /// $S_\mathrm{inter} = -k_B\sum_k p_k\ln p_k$.
    pub fn inter_entropy(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::InterEntropy, || {
            let probabilities = self.probabilities()?;
            let mut values = ArrayD::zeros(self.grid().shape());
            for p in probabilities.values() {
                Zip::from(&mut values).and(p.values()).for_each(|acc, &p| {
                    if p > 0.0 {
                        *acc -= BOLTZMANN_CONSTANT * p * p.ln();
                    }
                });
            }
            self.output("inter_entropy", values)
        })
    }

    /// Intra-configurational entropy: $S_\mathrm{intra} = \sum_k p_kS_k$.
    ///
    /// Together with [Self::inter_entropy] this must reproduce
    /// [Self::entropy] up to the finite-difference error; neither is
    /// preferred over the other.
    pub fn intra_entropy(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::IntraEntropy, || {
            self.probability_weighted_sum("intra_entropy", PropertyKind::Entropy)
        })
    }

    /// System internal energy: $U = \sum_k p_kU_k$.
    pub fn internal_energy(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::InternalEnergy, || {
            self.probability_weighted_sum("internal_energy", PropertyKind::InternalEnergy)
        })
    }

    /// System pressure: $P = -(\partial F/\partial V)_T$.
    pub fn pressure(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::Pressure, || {
            let axis = self.volume_axis()?;
            let dfdv = self.helmholtz_energy()?.partial_derivative(axis)?;
            Ok(dfdv.with_values("pressure", -dfdv.values()))
        })
    }

    /// Bulk modulus: $B = V(\partial^2F/\partial V^2)_T$.
    pub fn bulk_modulus(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::BulkModulus, || {
            let axis = self.volume_axis()?;
            let volume = self.grid().axis_field(axis);
            let d2 = self
                .helmholtz_energy()?
                .partial_derivative(axis)?
                .partial_derivative(axis)?;
            self.output("bulk_modulus", volume * d2.values())
        })
    }

    /// Intra-configurational bulk modulus:
    /// $B_\mathrm{intra} = \sum_k p_kV(\partial^2F_k/\partial V^2)_T$.
    pub fn intra_bulk_modulus(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::IntraBulkModulus, || {
            let axis = self.volume_axis()?;
            let volume = self.grid().axis_field(axis);
            let probabilities = self.probabilities()?;
            let mut values = ArrayD::zeros(volume.raw_dim());
            for (configuration, p) in self.configurations().zip(probabilities.values()) {
                let d2 = configuration
                    .tabulated(PropertyKind::HelmholtzEnergy)?
                    .partial_derivative(axis)?
                    .partial_derivative(axis)?;
                Zip::from(&mut values)
                    .and(p.values())
                    .and(d2.values())
                    .and(&volume)
                    .for_each(|acc, &p, &d2, &v| *acc += p * v * d2);
            }
            self.output("intra_bulk_modulus", values)
        })
    }

    /// Inter-configurational bulk modulus from the fluctuation of the
    /// per-configuration pressures:
    /// $B_\mathrm{inter} = \frac{V}{k_BT}\left[\left(\sum_kp_kF_k'\right)^2
    /// - \sum_kp_k(F_k')^2\right]$ with $F_k' = \partial F_k/\partial V$;
    /// 0 at $T = 0$.
    pub fn inter_bulk_modulus(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::InterBulkModulus, || {
            let axis = self.volume_axis()?;
            let volume = self.grid().axis_field(axis);
            let temperature = self.grid().axis_field(self.temperature_axis());
            let probabilities = self.probabilities()?;
            let mut mean = ArrayD::<f64>::zeros(volume.raw_dim());
            let mut mean_sq = ArrayD::<f64>::zeros(volume.raw_dim());
            for (configuration, p) in self.configurations().zip(probabilities.values()) {
                let d1 = configuration
                    .tabulated(PropertyKind::HelmholtzEnergy)?
                    .partial_derivative(axis)?;
                Zip::from(&mut mean)
                    .and(&mut mean_sq)
                    .and(p.values())
                    .and(d1.values())
                    .for_each(|m, m2, &p, &d| {
                        *m += p * d;
                        *m2 += p * d * d;
                    });
            }
            let mut values = ArrayD::zeros(volume.raw_dim());
            Zip::from(&mut values)
                .and(&mean)
                .and(&mean_sq)
                .and(&volume)
                .and(&temperature)
                .for_each(|b, &m, &m2, &v, &t| {
                    *b = if t > 0.0 {
                        v / (BOLTZMANN_CONSTANT * t) * (m * m - m2)
                    } else {
                        0.0
                    };
                });
            self.output("inter_bulk_modulus", values)
        })
    }

    /// Isochoric heat capacity: $C_V = T(\partial S/\partial T)_V$ of the
    /// derivative-based entropy.
    pub fn heat_capacity(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::HeatCapacity, || {
            let temperature = self.grid().axis_field(self.temperature_axis());
            let dsdt = self
                .entropy()?
                .partial_derivative(self.temperature_axis())?;
            self.output("heat_capacity", temperature * dsdt.values())
        })
    }

    /// Inter-configurational heat capacity from the internal-energy
    /// fluctuation:
    /// $C_{V,\mathrm{inter}} = (\langle U^2\rangle - \langle U\rangle^2)
    /// /(k_BT^2)$; 0 at $T = 0$.
    pub fn inter_heat_capacity(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::InterHeatCapacity, || {
            let temperature = self.grid().axis_field(self.temperature_axis());
            let probabilities = self.probabilities()?;
            let mut mean = ArrayD::<f64>::zeros(temperature.raw_dim());
            let mut mean_sq = ArrayD::<f64>::zeros(temperature.raw_dim());
            for (configuration, p) in self.configurations().zip(probabilities.values()) {
                let u = configuration.tabulated(PropertyKind::InternalEnergy)?;
                Zip::from(&mut mean)
                    .and(&mut mean_sq)
                    .and(p.values())
                    .and(u.values())
                    .for_each(|m, m2, &p, &u| {
                        *m += p * u;
                        *m2 += p * u * u;
                    });
            }
            let mut values = ArrayD::zeros(temperature.raw_dim());
            Zip::from(&mut values)
                .and(&mean)
                .and(&mean_sq)
                .and(&temperature)
                .for_each(|c, &m, &m2, &t| {
                    *c = if t > 0.0 {
                        (m2 - m * m) / (BOLTZMANN_CONSTANT * t * t)
                    } else {
                        0.0
                    };
                });
            self.output("inter_heat_capacity", values)
        })
    }

    /// Intra-configurational heat capacity:
    /// $C_{V,\mathrm{intra}} = \sum_k p_kC_{V,k}$.
    pub fn intra_heat_capacity(&self) -> ZentropyResult<TabulatedProperty> {
        self.cached(EnsembleProperty::IntraHeatCapacity, || {
            self.probability_weighted_sum("intra_heat_capacity", PropertyKind::HeatCapacity)
        })
    }

    /// System Helmholtz energy re-expressed over (temperature, pressure).
    pub fn helmholtz_energy_tp(
        &self,
        pressures: &Array1<f64>,
        options: TransformOptions,
    ) -> ZentropyResult<TabulatedProperty> {
        let f = self.helmholtz_energy()?;
        let p = self.pressure()?;
        helmholtz_to_temperature_pressure(&f, &p, pressures, options)
    }

    /// Probability-weighted average of a per-configuration property.
    fn probability_weighted_sum(
        &self,
        label: &str,
        kind: PropertyKind,
    ) -> ZentropyResult<TabulatedProperty> {
        let probabilities = self.probabilities()?;
        let mut values = ArrayD::zeros(self.grid().shape());
        for (configuration, p) in self.configurations().zip(probabilities.values()) {
            let property = configuration.tabulated(kind)?;
            Zip::from(&mut values)
                .and(p.values())
                .and(property.values())
                .for_each(|acc, &p, &x| *acc += p * x);
        }
        self.output(label, values)
    }
}
