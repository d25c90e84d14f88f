use pretty::DocAllocator;

pub trait ParensExt<'a, D, A: 'a>
where
    D: ?Sized + DocAllocator<'a, A>,
{
    /// Wrap in parentheses only when the condition holds.
    fn parens_if(self, condition: bool) -> pretty::DocBuilder<'a, D, A>;
}

impl<'a, D, A> ParensExt<'a, D, A> for pretty::DocBuilder<'a, D, A>
where
    D: ?Sized + DocAllocator<'a, A>,
{
    fn parens_if(self, condition: bool) -> pretty::DocBuilder<'a, D, A> {
        if condition { self.parens() } else { self }
    }
}
