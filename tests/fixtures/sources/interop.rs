//! Holders for the interop generator.

pub trait IUnkHolderIgnore {
    #[preserve_sig]
    fn Ignore(
        &self,
        p1: Option<&IUnknown>,
        p2: &Guid,
        #[marshal_as(IUnknown, iid_param = 1)]
        #[out]
        p3: &mut Option<IUnknown>,
    ) -> HRESULT;
}

pub mod test32 {
    pub trait IUnkHolder {
        /// Gets the held object as the requested interface.
        #[PreserveSig]
        fn GetObj(
            &self,
            p1: Option<&IUnknown>,
            p2: &Guid,
            #[MarshalAs(UnmanagedType::IUnknown, IidParameterIndex = 1)]
            #[out]
            p3: &mut Option<IUnknown>,
            p4: &mut NativeOverlapped,
            #[out] p5: &mut i64,
        ) -> HRESULT;

        fn GetObj2(
            &self,
            p1: f32,
            p2: &Guid,
            #[marshal_as(IUnknown, iid_param = 1)]
            #[out]
            p3: &mut Option<IUnknown>,
        );

        #[preserve_sig]
        fn Ignore1(&self, p1: Option<&IUnknown>, p2: &Guid, #[marshal_as(IUnknown)] p3: Option<&IUnknown>) -> HRESULT;

        #[preserve_sig]
        fn Ignore2(
            &self,
            p1: Option<&IUnknown>,
            p2: &Guid,
            #[marshal_as(IUnknown)]
            #[out]
            p3: &mut Option<IUnknown>,
        ) -> HRESULT;

        #[preserve_sig]
        fn Ignore3(&self, #[marshal_as(LPArray)] #[out] p3: &mut [i32]) -> HRESULT;

        #[suppress_auto_gen]
        fn Ignore4(
            &self,
            p1: f32,
            p2: &Guid,
            #[marshal_as(IUnknown, iid_param = 1)]
            #[out]
            p3: &mut Option<IUnknown>,
        );
    }

    extern "system" {
        /// Gets the held object as the requested interface.
        pub fn GetObj(
            p1: *mut c_void,
            p2: &Guid,
            #[marshal_as(IUnknown, iid_param = 1)]
            #[out]
            p3: &mut Option<IUnknown>,
        ) -> HRESULT;
    }
}
