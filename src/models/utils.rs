use super::{Error, MipSolution};

/// Creates nested vectors of variables, one per index tuple.
pub trait AddVars: Sized {
    type Out<T>;

    /// Create a variable with a closure
    fn vars_with<T, F: FnMut(Self) -> Result<T, Error>>(
        &self,
        func: F,
    ) -> Result<Self::Out<T>, Error>;
}

impl AddVars for usize {
    type Out<T> = Vec<T>;

    fn vars_with<T, F: FnMut(Self) -> Result<T, Error>>(
        &self,
        mut func: F,
    ) -> Result<Self::Out<T>, Error> {
        let mut vec = Vec::with_capacity(*self);
        for i in 0..*self {
            vec.push(func(i)?);
        }

        Ok(vec)
    }
}

impl AddVars for (usize, usize) {
    type Out<T> = Vec<<usize as AddVars>::Out<T>>;

    fn vars_with<T, F: FnMut(Self) -> Result<T, Error>>(
        &self,
        mut func: F,
    ) -> Result<Self::Out<T>, Error> {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push(self.1.vars_with(|j| func((i, j)))?);
        }

        Ok(out)
    }
}

impl AddVars for (usize, usize, usize) {
    type Out<T> = Vec<<(usize, usize) as AddVars>::Out<T>>;

    fn vars_with<T, F: FnMut(Self) -> Result<T, Error>>(
        &self,
        mut func: F,
    ) -> Result<Self::Out<T>, Error> {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push((self.1, self.2).vars_with(|(j, k)| func((i, j, k)))?)
        }

        Ok(out)
    }
}

/// Trait that converts solver variables to their solved values
pub trait ConvertVars<S: MipSolution> {
    type Out;
    fn convert(&self, solution: &S) -> Result<Self::Out, Error>;
}

impl<S: MipSolution, T: ConvertVars<S>> ConvertVars<S> for Vec<T> {
    type Out = Vec<T::Out>;

    fn convert(&self, solution: &S) -> Result<Self::Out, Error> {
        let mut out = Vec::with_capacity(self.len());
        for e in self {
            out.push(e.convert(solution)?);
        }
        Ok(out)
    }
}
