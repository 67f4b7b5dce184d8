/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

/// Random distributions usable as dimensions and as field functions.
pub mod distribution;

/// Deterministic, infinite numeric sequences.
pub mod iterable;

pub use distribution::Choice;
pub use distribution::Distribution;
pub use distribution::DistributionError;
pub use distribution::IntUniform;
pub use distribution::LogUniform;
pub use distribution::Uniform;
pub use iterable::ExponentialStep;
pub use iterable::LinearStep;
