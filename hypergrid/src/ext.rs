/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

/// Flat `{name: [values]}` parameter grids, as used by
/// scikit-learn's `ParameterGrid`.
pub mod param_grid;

pub use param_grid::ConversionError;
pub use param_grid::ParameterGrid;
